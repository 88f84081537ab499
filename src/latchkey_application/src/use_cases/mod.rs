pub mod find_refresh_token;
pub mod find_user;
pub mod issue_refresh_token;
pub mod login;
pub mod logout;
pub mod register;
pub mod rotate_refresh_token;
pub mod verify_credentials;

pub use find_refresh_token::FindRefreshTokenUseCase;
pub use find_user::FindUserUseCase;
pub use issue_refresh_token::IssueRefreshTokenUseCase;
pub use login::LoginUseCase;
pub use logout::LogoutUseCase;
pub use register::RegisterUseCase;
pub use rotate_refresh_token::RotateRefreshTokenUseCase;
pub use verify_credentials::VerifyCredentialsUseCase;
