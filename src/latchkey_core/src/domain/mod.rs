pub mod access_token;
pub mod email;
pub mod password;
pub mod password_hash;
pub mod refresh_token;
pub mod user;
pub mod user_id;
