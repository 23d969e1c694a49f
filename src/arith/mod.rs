pub mod miller_rabin;
pub mod misc;
pub mod modular_arithmetic;
pub mod montgomery_point;
pub mod sieve;
