use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::constants::FRIEND_CODE_MAX_ATTEMPTS;
use crate::modules::{
    friend::code::assign_unique_code,
    media::{
        model::{is_external_url, is_owned_object},
        storage::MediaStorage,
    },
    user::{
        model::{
            InsertUser, OAuthProfileModel, ProfileResponse, RegisterModel, RegisterResponse,
            SignInModel, UpdateProfileModel, UpdateUser, UsernameAvailability, validate_username,
        },
        repository::UserRepository,
        schema::{AuthProvider, MediaSlot, UserEntity},
    },
};
use crate::utils::{Claims, TokenConfig, TypeClaims, hash_password, verify_password};

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    storage: Arc<dyn MediaStorage + Send + Sync>,
    tokens: TokenConfig,
    signed_url_ttl: u64,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        storage: Arc<dyn MediaStorage + Send + Sync>,
        tokens: TokenConfig,
        signed_url_ttl: u64,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, storage, tokens, signed_url_ttl }
    }

    pub fn refresh_ttl(&self) -> u64 {
        self.tokens.refresh_ttl
    }

    /// New accounts get a friend code right away. The account already exists
    /// at this point, so failing here is logged rather than returned; the
    /// user can generate a code later.
    async fn give_friend_code(&self, user: &UserEntity) {
        if user.friend_code.is_some() {
            return;
        }

        match assign_unique_code(self.repo.as_ref(), &user.id, FRIEND_CODE_MAX_ATTEMPTS).await {
            Ok(Some(_)) => {}
            Ok(None) => warn!("Could not assign a friend code to user {}", user.id),
            Err(e) => warn!("Friend code assignment failed for user {}: {}", user.id, e),
        }
    }

    pub async fn register(
        &self,
        model: RegisterModel,
    ) -> Result<RegisterResponse, error::SystemError> {
        let email = model.email.trim().to_lowercase();
        let password_hash = hash_password(&model.password)?;

        let display_name = email.split('@').next().filter(|s| !s.is_empty()).map(str::to_string);

        let user = self
            .repo
            .create(&InsertUser {
                email,
                password_hash: Some(password_hash),
                auth_provider: AuthProvider::Credentials,
                email_verified: false,
                display_name,
                avatar_url: None,
            })
            .await?;

        self.give_friend_code(&user).await;

        info!("User {} registered", user.id);
        Ok(RegisterResponse { id: user.id, email: user.email })
    }

    pub async fn sign_in(&self, model: SignInModel) -> Result<(String, String), error::SystemError> {
        let email = model.email.trim().to_lowercase();
        let user = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("Invalid email or password"))?;

        let hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| error::SystemError::unauthorized("Invalid email or password"))?;

        if !verify_password(hash, &model.password)? {
            return Err(error::SystemError::unauthorized("Invalid email or password"));
        }

        self.tokens.issue_pair(&user.id)
    }

    pub async fn refresh(
        &self,
        refresh_token: Option<String>,
    ) -> Result<(String, String), error::SystemError> {
        let token = refresh_token
            .ok_or_else(|| error::SystemError::unauthorized("Missing refresh token"))?;

        let claims = Claims::decode(&token, self.tokens.secret.as_bytes())
            .map_err(|_| error::SystemError::unauthorized("Invalid refresh token"))?;

        if !claims.is(TypeClaims::RefreshToken) {
            return Err(error::SystemError::unauthorized("Invalid refresh token"));
        }

        if self.repo.find_by_id(&claims.sub).await?.is_none() {
            return Err(error::SystemError::unauthorized("Invalid refresh token"));
        }

        self.tokens.issue_pair(&claims.sub)
    }

    /// Finds or creates the account behind a completed OAuth handshake and
    /// issues a session for it.
    pub async fn oauth_sign_in(
        &self,
        model: OAuthProfileModel,
    ) -> Result<(String, String), error::SystemError> {
        if model.provider == AuthProvider::Credentials {
            return Err(error::SystemError::bad_request("Unsupported provider"));
        }

        let email = model.email.trim().to_lowercase();

        let user = match self.repo.find_by_email(&email).await? {
            Some(user) => {
                if let Some(image) = model.image.as_deref() {
                    if user.avatar_url.as_deref() != Some(image) {
                        self.repo.set_media(&user.id, MediaSlot::Avatar, image).await?;
                    }
                }
                user
            }
            None => {
                let display_name = model
                    .name
                    .filter(|n| !n.trim().is_empty())
                    .or_else(|| email.split('@').next().map(str::to_string));

                let user = self
                    .repo
                    .create(&InsertUser {
                        email,
                        password_hash: None,
                        auth_provider: model.provider,
                        email_verified: true,
                        display_name,
                        avatar_url: model.image,
                    })
                    .await?;

                self.give_friend_code(&user).await;
                info!("User {} created through {:?} sign-in", user.id, model.provider);
                user
            }
        };

        self.tokens.issue_pair(&user.id)
    }

    /// Stored object paths are turned into short-lived signed URLs;
    /// external URLs pass through. Paths outside the owner's prefix are
    /// never signed.
    fn sign_media(
        &self,
        owner: &Uuid,
        value: Option<String>,
    ) -> Result<Option<String>, error::SystemError> {
        match value {
            Some(url) if is_external_url(&url) => Ok(Some(url)),
            Some(path) if is_owned_object(owner, &path) => {
                Ok(Some(self.storage.signed_url(&path, self.signed_url_ttl)?))
            }
            Some(path) => {
                warn!("User {} has a media path outside their prefix: {}", owner, path);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub async fn get_profile(&self, id: Uuid) -> Result<ProfileResponse, error::SystemError> {
        let user = self
            .repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        let mut profile = ProfileResponse::from(user);
        profile.avatar_url = self.sign_media(&id, profile.avatar_url.take())?;
        profile.banner_url = self.sign_media(&id, profile.banner_url.take())?;
        Ok(profile)
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        model: UpdateProfileModel,
    ) -> Result<(), error::SystemError> {
        if model.is_empty() {
            return Err(error::SystemError::bad_request("No fields to update"));
        }

        for (field, value) in [("avatar", &model.avatar_url), ("banner", &model.banner_url)] {
            if let Some(value) = value.as_deref() {
                if !is_external_url(value) && !is_owned_object(&id, value) {
                    return Err(error::SystemError::bad_request(format!("Invalid {} url", field)));
                }
            }
        }

        self.repo.update(&id, &UpdateUser::from(model)).await?;
        info!("User {} updated their profile", id);
        Ok(())
    }

    pub async fn username_availability(
        &self,
        id: Uuid,
        username: &str,
    ) -> Result<UsernameAvailability, error::SystemError> {
        if validate_username(username).is_err() {
            return Ok(UsernameAvailability { available: false, reason: Some("invalid".into()) });
        }

        let available = match self.repo.find_by_username(username).await? {
            Some(owner) => owner.id == id,
            None => true,
        };

        Ok(UsernameAvailability {
            available,
            reason: (!available).then(|| "taken".to_string()),
        })
    }
}
