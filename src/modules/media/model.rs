use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::MEDIA_BUCKET_PREFIX;

/// Upload limits for profile media.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_file_size: usize,
    pub allowed_mime_types: Vec<String>,
    pub signed_url_ttl: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 5 * 1024 * 1024, // 5MB
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
            ],
            signed_url_ttl: 60 * 60,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub path: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    pub token: String,
}

pub fn is_external_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

/// Objects a user uploaded live under `users/{owner}/`.
pub fn is_owned_object(owner: &Uuid, path: &str) -> bool {
    let prefix = format!("{}/{}/", MEDIA_BUCKET_PREFIX, owner);
    path.strip_prefix(&prefix).is_some_and(|rest| {
        !rest.is_empty() && rest.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ownership_follows_the_user_prefix() {
        let owner = Uuid::now_v7();
        let other = Uuid::now_v7();

        assert!(is_owned_object(&owner, &format!("users/{owner}/avatar.png")));
        assert!(!is_owned_object(&owner, &format!("users/{other}/banner.png")));
        assert!(!is_owned_object(&owner, &format!("users/{owner}/../{other}/banner.png")));
        assert!(!is_owned_object(&owner, &format!("users/{owner}/")));
        assert!(!is_owned_object(&owner, "avatar.png"));
    }

    #[test]
    fn external_urls_need_a_scheme() {
        assert!(is_external_url("https://cdn.example/a.png"));
        assert!(is_external_url("http://cdn.example/a.png"));
        assert!(!is_external_url("httpusers/a.png"));
        assert!(!is_external_url("users/a.png"));
    }
}
