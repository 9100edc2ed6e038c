use std::sync::Arc;

use uuid::Uuid;

use crate::{
    constants::FRIEND_CODE_MAX_ATTEMPTS,
    modules::{
        friend::{
            code::{assign_unique_code, is_valid_friend_code},
            error::FriendError,
            model::{
                FriendResponse, PublicUser, ReceiverRef, RequestsEnvelope, UnfriendTarget,
            },
            repository::FriendRepo,
            schema::{FriendPair, FriendRequestEntity, RequestAction},
        },
        user::{repository::UserRepository, schema::UserEntity},
    },
};

pub struct FriendService<R, U>
where
    R: FriendRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    friend_repo: Arc<R>,
    user_repo: Arc<U>,
}

impl<R, U> Clone for FriendService<R, U>
where
    R: FriendRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    fn clone(&self) -> Self {
        FriendService { friend_repo: self.friend_repo.clone(), user_repo: self.user_repo.clone() }
    }
}

impl<R, U> FriendService<R, U>
where
    R: FriendRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(friend_repo: Arc<R>, user_repo: Arc<U>) -> Self {
        FriendService { friend_repo, user_repo }
    }

    async fn resolve_receiver(&self, receiver: &ReceiverRef) -> Result<UserEntity, FriendError> {
        let user = match receiver {
            ReceiverRef::Id(id) => self.user_repo.find_by_id(id).await?,
            ReceiverRef::Code(code) => {
                if !is_valid_friend_code(code) {
                    return Err(FriendError::InvalidFriendCode);
                }
                self.user_repo.find_by_friend_code(code).await?
            }
        };

        user.ok_or(FriendError::ReceiverNotFound)
    }

    pub async fn send_friend_request(
        &self,
        sender_id: Uuid,
        receiver: Option<ReceiverRef>,
    ) -> Result<FriendRequestEntity, FriendError> {
        let receiver = receiver.ok_or(FriendError::MissingReceiver)?;
        if receiver == ReceiverRef::Id(sender_id) {
            return Err(FriendError::SelfRequest);
        }

        let receiver_id = self.resolve_receiver(&receiver).await?.id;

        if receiver_id == sender_id {
            return Err(FriendError::SelfRequest);
        }

        let pair = FriendPair::new(sender_id, receiver_id);

        let (friendship, pending) = tokio::try_join!(
            self.friend_repo.find_friendship(&pair),
            self.friend_repo.find_pending_request(&pair),
        )?;

        if friendship.is_some() {
            return Err(FriendError::AlreadyFriends);
        }

        if pending.is_some() {
            return Err(FriendError::DuplicateRequest);
        }

        // a racing sender that passed the checks above trips the pending-pair
        // index here and comes back as DuplicateRequest
        let request = self.friend_repo.create_friend_request(&sender_id, &receiver_id).await?;

        log::info!("Friend request {} sent from {} to {}", request.id, sender_id, receiver_id);
        Ok(request)
    }

    pub async fn respond_to_request(
        &self,
        user_id: Uuid,
        request_id: Uuid,
        action: RequestAction,
    ) -> Result<FriendRequestEntity, FriendError> {
        let request =
            self.friend_repo.respond_to_request_atomic(&request_id, &user_id, action).await?;

        log::info!("Friend request {} is now {:?}", request.id, request.status);
        Ok(request)
    }

    /// Sender cancels, or either side clears a handled request.
    pub async fn delete_request(&self, user_id: Uuid, request_id: Uuid) -> Result<(), FriendError> {
        let request = self
            .friend_repo
            .find_friend_request_by_id(&request_id)
            .await?
            .ok_or(FriendError::RequestNotFound)?;

        if !request.is_party(&user_id) {
            return Err(FriendError::NotRequestParty);
        }

        if !self.friend_repo.delete_friend_request(&request_id).await? {
            return Err(FriendError::RequestNotFound);
        }

        Ok(())
    }

    pub async fn get_friend_requests(&self, user_id: Uuid) -> Result<RequestsEnvelope, FriendError> {
        let (mut incoming, mut outgoing) = tokio::try_join!(
            self.friend_repo.find_friend_request_to_user(&user_id),
            self.friend_repo.find_friend_request_from_user(&user_id),
        )?;

        incoming.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        outgoing.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(RequestsEnvelope { incoming, outgoing })
    }

    /// Newest friendship first.
    pub async fn get_friends(&self, user_id: Uuid) -> Result<Vec<FriendResponse>, FriendError> {
        let (as_user1, as_user2) = tokio::try_join!(
            self.friend_repo.find_friends_as_user1(&user_id),
            self.friend_repo.find_friends_as_user2(&user_id),
        )?;

        let mut all = Vec::with_capacity(as_user1.len() + as_user2.len());
        all.extend(as_user1);
        all.extend(as_user2);
        all.sort_by(|a, b| b.friends_since.cmp(&a.friends_since));
        Ok(all)
    }

    pub async fn unfriend(&self, user_id: Uuid, target: UnfriendTarget) -> Result<(), FriendError> {
        let friendship = match target {
            UnfriendTarget::Friendship(friendship_id) => {
                let friendship = self
                    .friend_repo
                    .find_friendship_by_id(&friendship_id)
                    .await?
                    .ok_or(FriendError::FriendshipNotFound)?;

                if !friendship.pair().contains(&user_id) {
                    return Err(FriendError::NotFriendshipMember);
                }
                friendship
            }
            UnfriendTarget::User(friend_id) => self
                .friend_repo
                .find_friendship(&FriendPair::new(user_id, friend_id))
                .await?
                .ok_or(FriendError::FriendshipNotFound)?,
        };

        if !self.friend_repo.delete_friendship(&friendship.id).await? {
            return Err(FriendError::FriendshipNotFound);
        }

        log::info!("User {} removed friendship {}", user_id, friendship.id);
        Ok(())
    }

    pub async fn find_by_code(&self, user_id: Uuid, code: &str) -> Result<PublicUser, FriendError> {
        if !is_valid_friend_code(code) {
            return Err(FriendError::InvalidFriendCode);
        }

        let user =
            self.user_repo.find_by_friend_code(code).await?.ok_or(FriendError::CodeNotFound)?;

        if user.id == user_id {
            return Err(FriendError::SelfRequest);
        }

        Ok(PublicUser::from(user))
    }

    pub async fn generate_friend_code(&self, user_id: Uuid) -> Result<String, FriendError> {
        let code = assign_unique_code(self.user_repo.as_ref(), &user_id, FRIEND_CODE_MAX_ATTEMPTS)
            .await?
            .ok_or(FriendError::ExhaustedAttempts)?;

        log::info!("User {} has a new friend code", user_id);
        Ok(code)
    }
}
