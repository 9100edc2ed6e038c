use std::path::{Component, Path, PathBuf};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::api::error::SystemError;

/// Object storage for user media. Paths are relative, `/`-separated keys.
#[async_trait::async_trait]
pub trait MediaStorage {
    /// Stores `bytes` at `path`, replacing any existing object.
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str)
    -> Result<(), SystemError>;

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, SystemError>;

    /// A URL granting read access to `path` for `ttl` seconds.
    fn signed_url(&self, path: &str, ttl: u64) -> Result<String, SystemError>;

    fn verify_signature(&self, path: &str, token: &str) -> Result<(), SystemError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct MediaClaims {
    path: String,
    exp: u64,
}

/// Keeps objects on the local filesystem and signs URLs pointing at the
/// `/media` route of this server.
#[derive(Clone)]
pub struct LocalMediaStorage {
    root: PathBuf,
    base_url: String,
    secret: String,
}

impl LocalMediaStorage {
    pub fn new(
        root: impl Into<PathBuf>,
        base_url: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            secret: secret.into(),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, SystemError> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(SystemError::bad_request("Invalid media path"));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), SystemError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, SystemError> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn signed_url(&self, path: &str, ttl: u64) -> Result<String, SystemError> {
        self.resolve(path)?;
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let claims = MediaClaims { path: path.to_string(), exp: now + ttl };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(format!("{}/{}?token={}", self.base_url, path, token))
    }

    fn verify_signature(&self, path: &str, token: &str) -> Result<(), SystemError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<MediaClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| SystemError::unauthorized("Invalid or expired media link"))?;

        if data.claims.path != path {
            return Err(SystemError::unauthorized("Invalid or expired media link"));
        }
        Ok(())
    }
}
