//! Error types used throughout the crate.
//!
//! [`InverseNotFound`] and [`CurveInitFail`] are the two internal control-flow
//! signals: both are always recovered by the nearest caller (an ECM engine or
//! its curve-sampling loop) and never escape to a user of this crate.
//! [`EcmError`] is the only error type that crosses the public boundary.

use rug::Integer;
use thiserror::Error;

/// Raised when an inversion attempt meets `gcd(x, n) > 1`. The caller
/// recovers by computing `gcd(x, n)`; when that gcd lies strictly between `1`
/// and `n` it is a factor of `n`.
#[derive(Clone, Debug, Error)]
#[error("inverse of {x} (mod {n}) not found")]
pub struct InverseNotFound {
    pub x: Integer,
    pub n: Integer,
}

impl InverseNotFound {
    pub fn new(x: Integer, n: Integer) -> Self {
        InverseNotFound { x, n }
    }

    /// The candidate factor this failure exposes: `gcd(x, n)`.
    pub fn gcd_factor(&self) -> Integer {
        Integer::from(self.x.clone()).gcd(&self.n)
    }
}

/// Raised by a Montgomery curve parametrization that rejects its inputs
/// (bad Suyama seed, or `A ≡ ±2 (mod n)`). The caller recovers by redrawing.
#[derive(Clone, Copy, Debug, Error)]
#[error("curve parametrization rejected its inputs")]
pub struct CurveInitFail;

/// An error raised while multiplying in the Montgomery or Weierstrass
/// arithmetic. Every ECM engine recovers from this by extracting
/// `gcd(x, n)` and either returning it as a factor or moving on.
#[derive(Clone, Debug, Error)]
pub enum ArithError {
    #[error(transparent)]
    InverseNotFound(#[from] InverseNotFound),
    #[error(transparent)]
    CurveInitFail(#[from] CurveInitFail),
}

/// Errors crossing the public API boundary.
#[derive(Clone, Debug, Error)]
pub enum EcmError {
    #[error("modulus must be >= 2, got {0}")]
    InvalidModulus(Integer),

    #[error("ECM requires a modulus >= 12, got {0}")]
    ModulusTooSmall(Integer),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("B1 must be strictly less than B2 (got B1={b1}, B2={b2})")]
    InvalidBounds { b1: u64, b2: u64 },

    #[error("wheel must be one of 30, 210, 2310, got {0}")]
    InvalidWheel(u64),
}
