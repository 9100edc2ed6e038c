use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{
        model::{InsertUser, UpdateUser},
        schema::{MediaSlot, UserEntity},
    },
};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, error::SystemError>;
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserEntity>, error::SystemError>;
    /// Exact, case-sensitive match.
    async fn find_by_friend_code(
        &self,
        code: &str,
    ) -> Result<Option<UserEntity>, error::SystemError>;
    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError>;
    async fn update(&self, id: &Uuid, user: &UpdateUser) -> Result<UserEntity, error::SystemError>;
    async fn set_friend_code(&self, id: &Uuid, code: &str) -> Result<(), error::SystemError>;
    async fn set_media(
        &self,
        id: &Uuid,
        slot: MediaSlot,
        path: &str,
    ) -> Result<(), error::SystemError>;
}
