use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::{
    friend::schema::{FriendRequestEntity, FriendRequestStatus, RequestAction},
    user::schema::UserEntity,
};

/// Public fields of a user, safe to show to anyone holding their code.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub friend_code: Option<String>,
}

impl From<UserEntity> for PublicUser {
    fn from(user: UserEntity) -> Self {
        PublicUser {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            friend_code: user.friend_code,
        }
    }
}

/// The other side of a friendship, as seen by the current user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FriendResponse {
    pub friendship_id: Uuid,
    pub id: Uuid,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub friend_code: Option<String>,
    pub friends_since: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum IdOrInfo {
    Id(Uuid),
    Info(PublicUser),
}

#[derive(sqlx::FromRow)]
pub struct FriendUserRow {
    pub req_id: Uuid,
    pub status: FriendRequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub user_id: Uuid,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub friend_code: Option<String>,
}

impl FriendUserRow {
    pub fn other_party(&self) -> PublicUser {
        PublicUser {
            id: self.user_id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
            friend_code: self.friend_code.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequestResponse {
    pub id: Uuid,
    pub from: IdOrInfo,
    pub to: IdOrInfo,
    pub status: FriendRequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct SendRequestBody {
    #[serde(alias = "receiverId")]
    pub receiver_id: Option<Uuid>,
    #[serde(alias = "friend_code")]
    #[validate(length(min = 1, message = "Friend code cannot be empty"))]
    pub code: Option<String>,
}

/// How the sender names the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiverRef {
    Id(Uuid),
    Code(String),
}

impl SendRequestBody {
    /// An explicit id wins over a code when both are sent.
    pub fn receiver(self) -> Option<ReceiverRef> {
        match (self.receiver_id, self.code) {
            (Some(id), _) => Some(ReceiverRef::Id(id)),
            (None, Some(code)) => Some(ReceiverRef::Code(code)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RespondBody {
    pub action: RequestAction,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CodeQuery {
    #[validate(length(min = 1, message = "Missing code"))]
    pub code: String,
}

/// How an unfriend call names the friendship to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfriendTarget {
    Friendship(Uuid),
    User(Uuid),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FriendsEnvelope {
    pub friends: Vec<FriendResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RequestsEnvelope {
    pub incoming: Vec<FriendRequestResponse>,
    pub outgoing: Vec<FriendRequestResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SentRequest {
    pub ok: bool,
    pub request: FriendRequestEntity,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: PublicUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FriendCodeResponse {
    pub friend_code: String,
}
