use uuid::Uuid;

use crate::api::error;
use crate::modules::friend::{
    error::FriendError,
    model::{FriendRequestResponse, FriendResponse},
    schema::{FriendPair, FriendRequestEntity, FriendshipEntity, RequestAction},
};

#[async_trait::async_trait]
pub trait FriendRepository {
    async fn find_friendship(
        &self,
        pair: &FriendPair,
    ) -> Result<Option<FriendshipEntity>, error::SystemError>;

    async fn find_friendship_by_id(
        &self,
        friendship_id: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError>;

    /// Friendships where `user_id` is stored as `user1_id`.
    async fn find_friends_as_user1(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError>;

    /// Friendships where `user_id` is stored as `user2_id`.
    async fn find_friends_as_user2(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError>;

    /// Returns whether a row was removed. A removal is remembered per pair
    /// so that a repeated accept cannot bring the friendship back.
    async fn delete_friendship(&self, friendship_id: &Uuid) -> Result<bool, error::SystemError>;
}

#[async_trait::async_trait]
pub trait FriendRequestRepository {
    /// The pending request between the pair, in either direction.
    async fn find_pending_request(
        &self,
        pair: &FriendPair,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    async fn find_friend_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    /// Pending requests sent by `user_id`, newest first.
    async fn find_friend_request_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestResponse>, error::SystemError>;

    /// Pending requests addressed to `user_id`, newest first.
    async fn find_friend_request_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestResponse>, error::SystemError>;

    async fn create_friend_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError>;

    /// Returns whether a row was removed.
    async fn delete_friend_request(&self, request_id: &Uuid) -> Result<bool, error::SystemError>;
}

#[async_trait::async_trait]
pub trait FriendRepo: FriendRepository + FriendRequestRepository + Send + Sync {
    /// Applies `action` to the request as one unit: the request row is locked,
    /// checked with [`FriendRequestEntity::resolve`], updated, and on accept
    /// the friendship is inserted before anything becomes visible.
    async fn respond_to_request_atomic(
        &self,
        request_id: &Uuid,
        user_id: &Uuid,
        action: RequestAction,
    ) -> Result<FriendRequestEntity, FriendError>;
}
