use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

use crate::modules::friend::error::FriendError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(type_name = "friend_request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    Accept,
    Reject,
}

/// An unordered pair of users stored as `(low, high)`, the same order the
/// `friendships` table keeps `(user1_id, user2_id)` in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FriendPair {
    pub low: Uuid,
    pub high: Uuid,
}

impl FriendPair {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        if a <= b { FriendPair { low: a, high: b } } else { FriendPair { low: b, high: a } }
    }

    pub fn contains(&self, user_id: &Uuid) -> bool {
        self.low == *user_id || self.high == *user_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FriendshipEntity {
    pub id: Uuid,
    pub user1_id: Uuid,
    pub user2_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl FriendshipEntity {
    pub fn pair(&self) -> FriendPair {
        FriendPair::new(self.user1_id, self.user2_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FriendRequestEntity {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: FriendRequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// What a response to a request should do to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Move out of `pending`; `Accepted` also materializes the friendship.
    Transition(FriendRequestStatus),
    /// The request was accepted earlier. Restore the friendship if it was
    /// lost rather than removed (see [`FriendRequestEntity::restores_friendship`]),
    /// then report [`FriendError::AlreadyHandled`].
    Reconcile,
}

impl FriendRequestEntity {
    pub fn pair(&self) -> FriendPair {
        FriendPair::new(self.sender_id, self.receiver_id)
    }

    pub fn is_party(&self, user_id: &Uuid) -> bool {
        self.sender_id == *user_id || self.receiver_id == *user_id
    }

    /// A repeated accept only restores the friendship when nobody unfriended
    /// the pair after this request was accepted.
    pub fn restores_friendship(
        &self,
        last_removed: Option<chrono::DateTime<chrono::Utc>>,
    ) -> bool {
        !matches!(last_removed, Some(removed_at) if removed_at >= self.updated_at)
    }

    /// The request state machine: only the receiver may act, and only a
    /// pending request moves.
    pub fn resolve(&self, actor: &Uuid, action: RequestAction) -> Result<Resolution, FriendError> {
        if self.receiver_id != *actor {
            return Err(FriendError::NotReceiver);
        }

        match (self.status, action) {
            (FriendRequestStatus::Pending, RequestAction::Accept) => {
                Ok(Resolution::Transition(FriendRequestStatus::Accepted))
            }
            (FriendRequestStatus::Pending, RequestAction::Reject) => {
                Ok(Resolution::Transition(FriendRequestStatus::Rejected))
            }
            (FriendRequestStatus::Accepted, RequestAction::Accept) => Ok(Resolution::Reconcile),
            _ => Err(FriendError::AlreadyHandled),
        }
    }
}
