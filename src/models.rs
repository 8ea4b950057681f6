pub mod discount;
pub mod stripe;
pub mod workspace;
