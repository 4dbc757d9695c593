use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hashed) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_the_hashed_password() {
        let hash = hash_password("user123").unwrap();
        assert!(verify_password("user123", &hash));
        assert!(!verify_password("user124", &hash));
    }

    #[test]
    fn garbage_hashes_never_verify() {
        assert!(!verify_password("user123", "not-a-phc-string"));
    }
}
