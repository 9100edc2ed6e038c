use crate::api::error::{self, SystemError};

pub const PENDING_PAIR_CONSTRAINT: &str = "friend_requests_pending_pair_key";
pub const FRIENDSHIP_PAIR_CONSTRAINT: &str = "friendships_pair_key";

#[derive(thiserror::Error, Debug)]
pub enum FriendError {
    #[error("A receiver id or friend code is required")]
    MissingReceiver,
    #[error("Invalid friend code format")]
    InvalidFriendCode,
    #[error("User not found")]
    ReceiverNotFound,
    #[error("Cannot send friend request to yourself")]
    SelfRequest,
    #[error("Users are already friends")]
    AlreadyFriends,
    #[error("Friend request already exists")]
    DuplicateRequest,
    #[error("Friend request not found")]
    RequestNotFound,
    #[error("Friend request already handled")]
    AlreadyHandled,
    #[error("Only the receiver can respond to this friend request")]
    NotReceiver,
    #[error("You are not part of this friend request")]
    NotRequestParty,
    #[error("Friendship not found")]
    FriendshipNotFound,
    #[error("You are not part of this friendship")]
    NotFriendshipMember,
    #[error("User not found")]
    CodeNotFound,
    #[error("Could not generate a unique friend code")]
    ExhaustedAttempts,
    #[error(transparent)]
    System(SystemError),
}

impl From<SystemError> for FriendError {
    fn from(err: SystemError) -> Self {
        if err.violates(PENDING_PAIR_CONSTRAINT) {
            FriendError::DuplicateRequest
        } else if err.violates(FRIENDSHIP_PAIR_CONSTRAINT) {
            FriendError::AlreadyFriends
        } else {
            FriendError::System(err)
        }
    }
}

impl From<sqlx::Error> for FriendError {
    fn from(err: sqlx::Error) -> Self {
        SystemError::from(err).into()
    }
}

impl From<FriendError> for error::Error {
    fn from(err: FriendError) -> Self {
        let msg = err.to_string();
        match err {
            FriendError::MissingReceiver
            | FriendError::InvalidFriendCode
            | FriendError::ReceiverNotFound
            | FriendError::SelfRequest => error::Error::bad_request(msg),
            FriendError::AlreadyFriends
            | FriendError::DuplicateRequest
            | FriendError::AlreadyHandled => error::Error::conflict(msg),
            FriendError::NotReceiver
            | FriendError::NotRequestParty
            | FriendError::NotFriendshipMember => error::Error::forbidden(msg),
            FriendError::RequestNotFound
            | FriendError::FriendshipNotFound
            | FriendError::CodeNotFound => error::Error::not_found(msg),
            FriendError::ExhaustedAttempts => {
                log::error!("Friend code generation exhausted its attempts");
                error::Error::InternalServer
            }
            FriendError::System(e) => e.into(),
        }
    }
}
