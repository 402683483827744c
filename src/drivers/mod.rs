pub mod convert;
pub mod filter;
pub mod tacho;
