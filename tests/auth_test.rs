use studyvault_rs::auth::password::{hash_password, verify_password};
use studyvault_rs::auth::{JwtService, TokenClaims};
use studyvault_rs::config::AuthConfig;
use uuid::Uuid;

fn jwt_service(expires_in: &str) -> JwtService {
    let config = AuthConfig {
        jwt_secret: "test-secret-key-for-jwt-authentication".to_string(),
        jwt_expires_in: expires_in.to_string(),
    };
    JwtService::new(&config).expect("Failed to create JWT service")
}

#[test]
fn test_token_round_trip() {
    let service = jwt_service("1h");
    let user_id = Uuid::new_v4();

    let token = service
        .create_token_for_user(user_id, "student@example.com".to_string(), "contributor".to_string())
        .expect("Failed to create token");

    let claims = service.decode_token(&token).expect("Failed to decode token");
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.email, "student@example.com");
    assert_eq!(claims.role, "contributor");
    assert!(!claims.is_expired());
}

#[test]
fn test_token_rejected_with_wrong_secret() {
    let service = jwt_service("1h");
    let other = JwtService::new(&AuthConfig {
        jwt_secret: "a-completely-different-secret".to_string(),
        jwt_expires_in: "1h".to_string(),
    })
    .unwrap();

    let token = service
        .create_token_for_user(Uuid::new_v4(), "x@example.com".to_string(), "viewer".to_string())
        .unwrap();

    assert!(other.decode_token(&token).is_err());
}

#[test]
fn test_expired_claims_detected() {
    let claims = TokenClaims::new(
        Uuid::new_v4(),
        "x@example.com".to_string(),
        "viewer".to_string(),
        chrono::Duration::seconds(-10),
    );
    assert!(claims.is_expired());
}

#[test]
fn test_password_hash_and_verify() {
    let hash = hash_password("correct horse battery staple").expect("Failed to hash");
    assert_ne!(hash, "correct horse battery staple");

    assert!(verify_password("correct horse battery staple", &hash).unwrap());
    assert!(!verify_password("wrong password", &hash).unwrap());
}

#[test]
fn test_hashes_are_salted() {
    let a = hash_password("same password").unwrap();
    let b = hash_password("same password").unwrap();
    assert_ne!(a, b);
}
