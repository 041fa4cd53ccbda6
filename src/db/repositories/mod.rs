pub mod account;
pub mod candidate;
pub mod token;
