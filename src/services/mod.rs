pub mod account_service;
pub use account_service::{
    Account, AccountError, AccountService, Candidate, NewRootAccount, NewSubAccount,
};

pub mod account_service_impl;
pub use account_service_impl::SeaOrmAccountService;

pub mod token_service;
pub use token_service::{IssuedToken, TokenError, TokenPurpose, TokenService};

pub mod token_service_impl;
pub use token_service_impl::SeaOrmTokenService;
