use serde::Deserialize;
use tracing::warn;

const DEV_JWT_SECRET: &str = "secret";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded images are written to and served from.
    pub dir: String,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Single allowed CORS origin, `*` for any.
    pub cors_origin: String,
    pub jwt: JwtConfig,
    pub uploads: UploadConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, falling back to an insecure development secret");
            DEV_JWT_SECRET.into()
        });
        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "cookbook".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "cookbook-users".into()),
            ttl_minutes: parse_or("JWT_TTL_MINUTES", 60),
        };
        let uploads = UploadConfig {
            dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
            max_bytes: parse_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
        };
        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or("APP_PORT", 5000),
            cors_origin: std::env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            jwt,
            uploads,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            warn!(key, value = %raw, "invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}
