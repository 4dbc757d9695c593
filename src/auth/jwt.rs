use std::time::{SystemTime, UNIX_EPOCH};

use crate::{model::role::Role, models::Claims};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

pub fn generate_access_token(
    user_id: u64,
    email: String,
    role: Role,
    secret: &str,
    ttl: usize,
) -> Result<String, Error> {
    let claims = Claims {
        user_id,
        sub: email,
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify_with_the_same_secret() {
        let token = generate_access_token(7, "ana@x.io".into(), Role::Manager, "s3cret", 60).unwrap();
        let claims = verify_token(&token, "s3cret").unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.sub, "ana@x.io");
        assert_eq!(claims.role, Role::Manager);
    }

    #[test]
    fn tokens_signed_elsewhere_are_rejected() {
        let token = generate_access_token(7, "ana@x.io".into(), Role::Admin, "one", 60).unwrap();
        assert!(verify_token(&token, "two").is_err());
    }

    #[test]
    fn every_token_gets_a_fresh_jti() {
        let a = generate_access_token(1, "a@x.io".into(), Role::Admin, "k", 60).unwrap();
        let b = generate_access_token(1, "a@x.io".into(), Role::Admin, "k", 60).unwrap();
        let (a, b) = (verify_token(&a, "k").unwrap(), verify_token(&b, "k").unwrap());
        assert_ne!(a.jti, b.jti);
    }
}
