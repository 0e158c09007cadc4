use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use serde::{Deserialize, Serialize};
use chrono::{Utc, Duration};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,        // user_id
    pub username: String,
    pub exp: i64,        // expiration timestamp
}

/// Clé secrète + durée de vie des tokens.
/// Enregistrée dans l'App (web::Data) et lue par l'extracteur AuthUser.
#[derive(Clone)]
pub struct JwtKeys {
    secret: String,
    ttl_hours: i64,
}

impl JwtKeys {
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_hours,
        }
    }

    /// Génère un JWT token pour un utilisateur
    pub fn generate_token(&self, user_id: i32, username: &str) -> Result<String, String> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::hours(self.ttl_hours))
            .ok_or("Failed to calculate expiration")?
            .timestamp();

        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
            .map_err(|e| format!("Failed to generate token: {}", e))
    }

    /// Vérifie et décode un JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, String> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::new(Algorithm::HS256),
        )
            .map(|data| data.claims)
            .map_err(|e| format!("Invalid token: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_verify_token() {
        let keys = JwtKeys::new("test-secret", 24);
        let user_id = 123;
        let username = "testuser";

        let token = keys.generate_token(user_id, username).unwrap();
        let claims = keys.verify_token(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, username);
    }

    #[test]
    fn test_invalid_token() {
        let keys = JwtKeys::new("test-secret", 24);
        let result = keys.verify_token("invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let token = JwtKeys::new("secret-a", 24).generate_token(1, "a").unwrap();
        assert!(JwtKeys::new("secret-b", 24).verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // exp dans le passé (au-delà de la tolérance par défaut de 60s)
        let keys = JwtKeys::new("test-secret", -2);
        let token = keys.generate_token(1, "late").unwrap();
        assert!(keys.verify_token(&token).is_err());
    }
}
