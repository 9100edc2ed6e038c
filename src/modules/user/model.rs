use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::api::error;
use crate::modules::user::schema::{AuthProvider, UserEntity};

#[derive(Deserialize, Validate)]
pub struct RegisterModel {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
    #[serde(alias = "confirmPassword")]
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Deserialize, Validate)]
pub struct SignInModel {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

/// Profile handed over by the external auth library after a completed
/// OAuth handshake.
#[derive(Deserialize, Validate)]
pub struct OAuthProfileModel {
    pub provider: AuthProvider,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub name: Option<String>,
    #[validate(url(message = "Invalid image url"))]
    pub image: Option<String>,
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len_ok = (3..=20).contains(&username.len());
    let chars_ok = username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.');
    if len_ok && chars_ok {
        Ok(())
    } else {
        Err(ValidationError::new("username")
            .with_message("Username must be 3-20 characters of a-z, 0-9, '_' or '.'".into()))
    }
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdateProfileModel {
    #[validate(custom(function = validate_username))]
    pub username: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Display name must be 1-50 characters"))]
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,
    pub discord: Option<String>,
    pub twitch: Option<String>,
    pub steam: Option<String>,
    pub twitter: Option<String>,
}

impl UpdateProfileModel {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.display_name.is_none()
            && self.avatar_url.is_none()
            && self.banner_url.is_none()
            && self.bio.is_none()
            && self.discord.is_none()
            && self.twitch.is_none()
            && self.steam.is_none()
            && self.twitter.is_none()
    }
}

#[derive(Deserialize, Validate)]
pub struct UsernameQuery {
    #[validate(length(min = 1, message = "Missing username"))]
    pub username: String,
}

pub struct InsertUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub auth_provider: AuthProvider,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

pub struct UpdateUser {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub bio: Option<String>,
    pub discord: Option<String>,
    pub twitch: Option<String>,
    pub steam: Option<String>,
    pub twitter: Option<String>,
}

impl From<UpdateProfileModel> for UpdateUser {
    fn from(model: UpdateProfileModel) -> Self {
        UpdateUser {
            username: model.username,
            display_name: model.display_name,
            avatar_url: model.avatar_url,
            banner_url: model.banner_url,
            bio: model.bio,
            discord: model.discord,
            twitch: model.twitch,
            steam: model.steam,
            twitter: model.twitter,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SignInResponse {
    pub access_token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub friend_code: Option<String>,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub bio: Option<String>,
    pub discord: Option<String>,
    pub twitch: Option<String>,
    pub steam: Option<String>,
    pub twitter: Option<String>,
}

impl From<UserEntity> for ProfileResponse {
    fn from(entity: UserEntity) -> Self {
        ProfileResponse {
            id: entity.id,
            email: entity.email,
            username: entity.username,
            display_name: entity.display_name,
            friend_code: entity.friend_code,
            avatar_url: entity.avatar_url,
            banner_url: entity.banner_url,
            bio: entity.bio,
            discord: entity.discord,
            twitch: entity.twitch,
            steam: entity.steam,
            twitter: entity.twitter,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ProfileEnvelope {
    pub profile: ProfileResponse,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct UsernameAvailability {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Shared secret the auth bridge presents. `None` disables the bridge.
#[derive(Debug, Clone, Default)]
pub struct OAuthBridgeConfig {
    pub secret: Option<String>,
}

impl OAuthBridgeConfig {
    pub fn accepts(&self, presented: Option<&str>) -> Result<(), error::Error> {
        let expected = self.secret.as_deref().ok_or_else(|| error::Error::not_found("Not Found"))?;
        match presented {
            Some(p) if p == expected => Ok(()),
            _ => Err(error::Error::unauthorized("Unauthorized")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("otaku_42").is_ok());
        assert!(validate_username("a.b").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("Upper").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(21)).is_err());
    }

    #[test]
    fn register_requires_matching_passwords() {
        let model = RegisterModel {
            email: "mika@example.com".into(),
            password: "longenough".into(),
            confirm_password: "different1".into(),
        };
        assert!(model.validate().is_err());

        let model = RegisterModel {
            email: "mika@example.com".into(),
            password: "longenough".into(),
            confirm_password: "longenough".into(),
        };
        assert!(model.validate().is_ok());
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(UpdateProfileModel::default().is_empty());
        let model = UpdateProfileModel { bio: Some("hi".into()), ..Default::default() };
        assert!(!model.is_empty());
    }

    #[test]
    fn bridge_secret_checks() {
        let bridge = OAuthBridgeConfig { secret: Some("s3cret".into()) };
        assert!(bridge.accepts(Some("s3cret")).is_ok());
        assert!(matches!(bridge.accepts(Some("nope")), Err(error::Error::Unauthorized(_))));
        assert!(matches!(bridge.accepts(None), Err(error::Error::Unauthorized(_))));

        let disabled = OAuthBridgeConfig::default();
        assert!(matches!(disabled.accepts(Some("s3cret")), Err(error::Error::NotFound(_))));
    }
}
