pub mod montgomery;
pub mod weierstrass;
