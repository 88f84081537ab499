pub mod hashmap_refresh_token_store;
pub mod hashmap_user_store;
pub mod postgres_refresh_token_store;
pub mod postgres_user_store;
pub mod redis_refresh_token_store;

pub use hashmap_refresh_token_store::HashMapRefreshTokenStore;
pub use hashmap_user_store::HashMapUserStore;
pub use postgres_refresh_token_store::PostgresRefreshTokenStore;
pub use postgres_user_store::PostgresUserStore;
pub use redis_refresh_token_store::RedisRefreshTokenStore;
