use latchkey::{
    Argon2PasswordHasher, AuthError, AuthService, HashMapRefreshTokenStore, HashMapUserStore,
    JwtAccessTokenIssuer, JwtConfig, Secret, TokenPolicy, UserId,
    adapters::config::PasswordHashingSettings,
};

#[tokio::test]
async fn facade_wires_a_working_service() {
    let service = AuthService::new(
        HashMapUserStore::new(),
        HashMapRefreshTokenStore::new(),
        Argon2PasswordHasher::new(&PasswordHashingSettings {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap(),
        JwtAccessTokenIssuer::new(JwtConfig {
            jwt_secret: Secret::new("facade".to_owned()),
            token_ttl_in_seconds: 60,
        }),
        TokenPolicy::default(),
    );

    let id = service
        .register(Secret::new("a@x.com".to_owned()), Secret::new("pw123".to_owned()))
        .await
        .unwrap();
    assert_eq!(id, UserId::new(1));

    let pair = service
        .login(Secret::new("a@x.com".to_owned()), Secret::new("pw123".to_owned()))
        .await
        .unwrap();
    let rotated = service
        .rotate(pair.refresh_token.value().as_str())
        .await
        .unwrap();

    assert_eq!(rotated.refresh_token.user_id(), id);
    assert_eq!(
        service
            .rotate(pair.refresh_token.value().as_str())
            .await
            .map(|p| p.refresh_token.user_id()),
        Err(AuthError::InvalidToken)
    );
}
