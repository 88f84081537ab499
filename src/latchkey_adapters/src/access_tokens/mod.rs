pub mod jwt_access_token_issuer;

pub use jwt_access_token_issuer::{Claims, JwtAccessTokenIssuer, JwtConfig};
