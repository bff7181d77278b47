pub(crate) use crate::auth::dto::{Claims, JwtKeys};
use crate::auth::dto::{NewUser, RegisterRequest};
use crate::config::JwtConfig;
use crate::error::AppError;
use crate::state::AppState;
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error};
use uuid::Uuid;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn required(field: Option<String>) -> Option<String> {
    field.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Trims every field, lower-cases the email and rejects incomplete input.
pub fn validate_register(req: RegisterRequest) -> Result<NewUser, AppError> {
    let (Some(username), Some(phone), Some(email), Some(password)) = (
        required(req.username),
        required(req.phone),
        required(req.email),
        // passwords keep their whitespace, they only have to be non-blank
        req.password.filter(|p| !p.trim().is_empty()),
    ) else {
        return Err(AppError::validation("All fields are required"));
    };

    let email = email.to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email"));
    }

    Ok(NewUser {
        username,
        phone,
        email,
        password,
    })
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64) * 60),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn sign(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

/// Rejects a mutation of a row that belongs to somebody else.
pub fn ensure_owner(owner_id: Uuid, requester: Uuid, what: &str) -> Result<(), AppError> {
    if owner_id != requester {
        return Err(AppError::forbidden(format!("No permission to modify this {what}")));
    }
    Ok(())
}


#[cfg(test)]
mod register_tests {
    use super::*;

    fn full() -> RegisterRequest {
        RegisterRequest {
            username: Some("  chef  ".into()),
            phone: Some("+7 900 000-00-00".into()),
            email: Some(" Chef@Example.COM ".into()),
            password: Some("pa ss".into()),
        }
    }

    #[test]
    fn normalizes_fields() {
        let user = validate_register(full()).unwrap();
        assert_eq!(user.username, "chef");
        assert_eq!(user.email, "chef@example.com");
        assert_eq!(user.password, "pa ss");
    }

    #[test]
    fn any_missing_field_is_a_validation_error() {
        let cases = [
            RegisterRequest { username: None, ..full() },
            RegisterRequest { phone: Some("   ".into()), ..full() },
            RegisterRequest { email: None, ..full() },
            RegisterRequest { password: Some("".into()), ..full() },
        ];
        for req in cases {
            let err = validate_register(req).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{err:?}");
        }
    }

    #[test]
    fn malformed_email_is_rejected() {
        let req = RegisterRequest { email: Some("not-an-email".into()), ..full() };
        assert!(matches!(validate_register(req), Err(AppError::Validation(_))));
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
    }
}
