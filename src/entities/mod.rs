pub mod account_tokens;
pub mod accounts;
pub mod candidates;
