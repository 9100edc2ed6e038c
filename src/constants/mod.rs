use std::str::FromStr;

use crate::api::error::SystemError;

pub const FRIEND_CODE_MAX_ATTEMPTS: usize = 100;
pub const MEDIA_BUCKET_PREFIX: &str = "users";
pub const REFRESH_COOKIE: &str = "refresh_token";
pub const BRIDGE_SECRET_HEADER: &str = "X-Bridge-Secret";

pub struct Env {
    pub jwt_secret: String,
    pub access_token_expiration: u64,
    pub refresh_token_expiration: u64,
    pub database_url: String,
    pub frontend_url: String,
    pub ip: String,
    pub port: u16,
    pub upload_dir: String,
    pub media_base_url: String,
    pub signed_url_ttl: u64,
    pub max_upload_size: usize,
    pub oauth_bridge_secret: Option<String>,
}

fn required(key: &'static str) -> Result<String, SystemError> {
    std::env::var(key).map_err(|_| {
        SystemError::config(format!("{key} must be set in .env file or environment variable"))
    })
}

fn or_default<T: FromStr>(key: &'static str, default: T) -> Result<T, SystemError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| SystemError::config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}

impl Env {
    pub fn load() -> Result<Self, SystemError> {
        let jwt_secret = required("SECRET_KEY")?;
        let access_token_expiration = or_default("ACCESS_TOKEN_EXPIRATION", 900u64)?;
        let refresh_token_expiration = or_default("REFRESH_TOKEN_EXPIRATION", 604_800u64)?;

        let database_url = required("DATABASE_URL")?;

        let frontend_url = or_default("FRONTEND_URL", "http://localhost:3000".to_string())?;
        let ip = or_default("IP", "127.0.0.1".to_string())?;
        let port = or_default("PORT", 8080u16)?;

        let upload_dir = or_default("UPLOAD_DIR", "./uploads".to_string())?;
        let media_base_url =
            or_default("MEDIA_BASE_URL", format!("http://{ip}:{port}/api/media"))?;
        let signed_url_ttl = or_default("SIGNED_URL_TTL", 3600u64)?;
        let max_upload_size = or_default("MAX_UPLOAD_SIZE", 5 * 1024 * 1024usize)?;
        let oauth_bridge_secret =
            std::env::var("OAUTH_BRIDGE_SECRET").ok().filter(|s| !s.trim().is_empty());

        Ok(Env {
            jwt_secret,
            access_token_expiration,
            refresh_token_expiration,
            database_url,
            frontend_url,
            ip,
            port,
            upload_dir,
            media_base_url,
            signed_url_ttl,
            max_upload_size,
            oauth_bridge_secret,
        })
    }
}
