pub mod error;
pub mod token_policy;
pub mod use_cases;

#[cfg(test)]
mod test_support;

pub use error::AuthError;
pub use token_policy::{DEFAULT_REFRESH_TOKEN_TTL_SECONDS, TokenPolicy};
pub use use_cases::{
    FindRefreshTokenUseCase, FindUserUseCase, IssueRefreshTokenUseCase, LoginUseCase,
    LogoutUseCase, RegisterUseCase, RotateRefreshTokenUseCase, VerifyCredentialsUseCase,
};
