use std::sync::Arc;

use rstest::rstest;
use uuid::Uuid;

use super::{MemoryStore, friend_service, seed_user, store};
use crate::api::error;
use crate::modules::friend::{
    code::assign_unique_code_with,
    error::FriendError,
    model::{IdOrInfo, ReceiverRef, UnfriendTarget},
    repository::{FriendRepository, FriendRequestRepository},
    schema::{FriendPair, FriendRequestStatus, RequestAction},
};

async fn pair(store: &Arc<MemoryStore>) -> (Uuid, Uuid) {
    (seed_user(store, "asuka", None).await, seed_user(store, "rei", Some("4821")).await)
}

#[rstest]
#[actix_web::test]
async fn send_leaves_exactly_one_pending_request(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, b) = pair(&store).await;

    let request = service.send_friend_request(a, Some(ReceiverRef::Id(b))).await.unwrap();

    assert_eq!(request.sender_id, a);
    assert_eq!(request.receiver_id, b);
    assert_eq!(request.status, FriendRequestStatus::Pending);
    assert_eq!(store.pending_between(a, b), 1);
}

#[rstest]
#[actix_web::test]
async fn send_by_code_resolves_receiver(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, b) = pair(&store).await;

    let request =
        service.send_friend_request(a, Some(ReceiverRef::Code("4821".into()))).await.unwrap();
    assert_eq!(request.receiver_id, b);
}

#[rstest]
#[actix_web::test]
async fn self_request_is_invalid(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (_, b) = pair(&store).await;

    let by_id = service.send_friend_request(b, Some(ReceiverRef::Id(b))).await.unwrap_err();
    assert!(matches!(by_id, FriendError::SelfRequest));

    let by_code =
        service.send_friend_request(b, Some(ReceiverRef::Code("4821".into()))).await.unwrap_err();
    assert!(matches!(by_code, FriendError::SelfRequest));
    assert!(matches!(error::Error::from(by_code), error::Error::BadRequest(_)));

    assert!(store.requests().is_empty());
}

#[rstest]
#[actix_web::test]
async fn receiver_must_be_named_and_exist(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, _) = pair(&store).await;

    let missing = service.send_friend_request(a, None).await.unwrap_err();
    assert!(matches!(missing, FriendError::MissingReceiver));

    let unknown =
        service.send_friend_request(a, Some(ReceiverRef::Id(Uuid::now_v7()))).await.unwrap_err();
    assert!(matches!(unknown, FriendError::ReceiverNotFound));

    let malformed =
        service.send_friend_request(a, Some(ReceiverRef::Code("48".into()))).await.unwrap_err();
    assert!(matches!(malformed, FriendError::InvalidFriendCode));
}

#[rstest]
#[actix_web::test]
async fn duplicate_in_either_direction_conflicts(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, b) = pair(&store).await;
    service.send_friend_request(a, Some(ReceiverRef::Id(b))).await.unwrap();

    let again = service.send_friend_request(a, Some(ReceiverRef::Id(b))).await.unwrap_err();
    assert!(matches!(again, FriendError::DuplicateRequest));

    let reverse = service.send_friend_request(b, Some(ReceiverRef::Id(a))).await.unwrap_err();
    assert!(matches!(reverse, FriendError::DuplicateRequest));
    assert!(matches!(error::Error::from(reverse), error::Error::Conflict(_)));

    assert_eq!(store.pending_between(a, b), 1);
}

#[rstest]
#[actix_web::test]
async fn concurrent_opposite_sends_let_one_through(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, b) = pair(&store).await;

    let (ab, ba) = tokio::join!(
        service.send_friend_request(a, Some(ReceiverRef::Id(b))),
        service.send_friend_request(b, Some(ReceiverRef::Id(a))),
    );

    let outcomes = [ab, ba];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes.iter().any(|r| matches!(r, Err(FriendError::DuplicateRequest))),
        "the losing sender must see a conflict"
    );
    assert_eq!(store.pending_between(a, b), 1);
}

#[rstest]
#[actix_web::test]
async fn pending_pair_violation_maps_to_duplicate(store: Arc<MemoryStore>) {
    let (a, b) = pair(&store).await;
    store.create_friend_request(&a, &b).await.unwrap();

    let err = store.create_friend_request(&b, &a).await.unwrap_err();
    assert!(matches!(FriendError::from(err), FriendError::DuplicateRequest));
}

#[rstest]
#[actix_web::test]
async fn accept_creates_exactly_one_friendship(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, b) = pair(&store).await;
    let request = service.send_friend_request(a, Some(ReceiverRef::Id(b))).await.unwrap();

    let accepted = service.respond_to_request(b, request.id, RequestAction::Accept).await.unwrap();

    assert_eq!(accepted.status, FriendRequestStatus::Accepted);
    let friendships = store.friendships();
    assert_eq!(friendships.len(), 1);
    assert_eq!(friendships[0].pair(), FriendPair::new(a, b));
    assert!(friendships[0].user1_id < friendships[0].user2_id);

    let again = service.send_friend_request(b, Some(ReceiverRef::Id(a))).await.unwrap_err();
    assert!(matches!(again, FriendError::AlreadyFriends));
}

#[rstest]
#[actix_web::test]
async fn reject_leaves_no_friendship(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, b) = pair(&store).await;
    let request = service.send_friend_request(a, Some(ReceiverRef::Id(b))).await.unwrap();

    let rejected = service.respond_to_request(b, request.id, RequestAction::Reject).await.unwrap();

    assert_eq!(rejected.status, FriendRequestStatus::Rejected);
    assert!(store.friendships().is_empty());

    let late_accept =
        service.respond_to_request(b, request.id, RequestAction::Accept).await.unwrap_err();
    assert!(matches!(late_accept, FriendError::AlreadyHandled));

    // a rejected request no longer blocks a new one
    service.send_friend_request(a, Some(ReceiverRef::Id(b))).await.unwrap();
}

#[rstest]
#[actix_web::test]
async fn sender_cannot_accept(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, b) = pair(&store).await;
    let request = service.send_friend_request(a, Some(ReceiverRef::Id(b))).await.unwrap();

    let err = service.respond_to_request(a, request.id, RequestAction::Accept).await.unwrap_err();

    assert!(matches!(err, FriendError::NotReceiver));
    assert!(matches!(error::Error::from(err), error::Error::Forbidden(_)));
    assert_eq!(store.pending_between(a, b), 1);
    assert!(store.friendships().is_empty());
}

#[rstest]
#[actix_web::test]
async fn respond_to_unknown_request(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (_, b) = pair(&store).await;

    let err =
        service.respond_to_request(b, Uuid::now_v7(), RequestAction::Accept).await.unwrap_err();
    assert!(matches!(err, FriendError::RequestNotFound));
}

#[rstest]
#[actix_web::test]
async fn simultaneous_accepts_create_one_friendship(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, b) = pair(&store).await;
    let request = service.send_friend_request(a, Some(ReceiverRef::Id(b))).await.unwrap();

    let (first, second) = tokio::join!(
        service.respond_to_request(b, request.id, RequestAction::Accept),
        service.respond_to_request(b, request.id, RequestAction::Accept),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes.iter().any(|r| matches!(r, Err(FriendError::AlreadyHandled))));
    assert_eq!(store.friendships().len(), 1);
}

#[rstest]
#[actix_web::test]
async fn repeated_accept_restores_missing_friendship(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, b) = pair(&store).await;
    let request = service.send_friend_request(a, Some(ReceiverRef::Id(b))).await.unwrap();
    service.respond_to_request(b, request.id, RequestAction::Accept).await.unwrap();

    // the friendship insert was lost after the status update
    store.lose_friendship(FriendPair::new(a, b));

    let err = service.respond_to_request(b, request.id, RequestAction::Accept).await.unwrap_err();
    assert!(matches!(err, FriendError::AlreadyHandled));
    assert_eq!(store.friendships().len(), 1);
}

#[rstest]
#[actix_web::test]
async fn repeated_accept_does_not_undo_unfriend(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, b) = pair(&store).await;
    let request = service.send_friend_request(a, Some(ReceiverRef::Id(b))).await.unwrap();
    service.respond_to_request(b, request.id, RequestAction::Accept).await.unwrap();

    service.unfriend(a, UnfriendTarget::User(b)).await.unwrap();

    let err = service.respond_to_request(b, request.id, RequestAction::Accept).await.unwrap_err();
    assert!(matches!(err, FriendError::AlreadyHandled));
    assert!(store.friendships().is_empty());

    // a fresh request still works, and its own acceptance can be repaired
    let again = service.send_friend_request(b, Some(ReceiverRef::Id(a))).await.unwrap();
    service.respond_to_request(a, again.id, RequestAction::Accept).await.unwrap();
    store.lose_friendship(FriendPair::new(a, b));
    let err = service.respond_to_request(a, again.id, RequestAction::Accept).await.unwrap_err();
    assert!(matches!(err, FriendError::AlreadyHandled));
    assert_eq!(store.friendships().len(), 1);
}

#[rstest]
#[actix_web::test]
async fn delete_request_rules(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, b) = pair(&store).await;
    let stranger = seed_user(&store, "shinji", None).await;
    let request = service.send_friend_request(a, Some(ReceiverRef::Id(b))).await.unwrap();

    let err = service.delete_request(stranger, request.id).await.unwrap_err();
    assert!(matches!(err, FriendError::NotRequestParty));

    service.delete_request(a, request.id).await.unwrap();
    assert!(store.find_friend_request_by_id(&request.id).await.unwrap().is_none());

    let err = service.delete_request(a, request.id).await.unwrap_err();
    assert!(matches!(err, FriendError::RequestNotFound));
}

#[rstest]
#[actix_web::test]
async fn requests_are_split_by_direction(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, b) = pair(&store).await;
    let c = seed_user(&store, "misato", None).await;

    let to_b = service.send_friend_request(a, Some(ReceiverRef::Id(b))).await.unwrap();
    let to_c = service.send_friend_request(a, Some(ReceiverRef::Id(c))).await.unwrap();

    let mine = service.get_friend_requests(a).await.unwrap();
    assert!(mine.incoming.is_empty());
    let outgoing: Vec<Uuid> = mine.outgoing.iter().map(|r| r.id).collect();
    assert_eq!(outgoing, vec![to_c.id, to_b.id]);

    let theirs = service.get_friend_requests(b).await.unwrap();
    assert_eq!(theirs.incoming.len(), 1);
    match &theirs.incoming[0].from {
        IdOrInfo::Info(user) => assert_eq!(user.id, a),
        IdOrInfo::Id(_) => panic!("incoming requests carry the sender profile"),
    }
    assert_eq!(theirs.incoming[0].to, IdOrInfo::Id(b));
}

#[rstest]
#[actix_web::test]
async fn friends_list_tracks_friendships(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, b) = pair(&store).await;
    let c = seed_user(&store, "misato", None).await;

    for other in [b, c] {
        let request = service.send_friend_request(a, Some(ReceiverRef::Id(other))).await.unwrap();
        service.respond_to_request(other, request.id, RequestAction::Accept).await.unwrap();
    }

    let friends = service.get_friends(a).await.unwrap();
    let ids: Vec<Uuid> = friends.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![c, b], "newest friendship first");

    let with_b = store.find_friendship(&FriendPair::new(a, b)).await.unwrap().unwrap();
    assert_eq!(friends[1].friendship_id, with_b.id);

    // the other side sees the same row
    let from_b = service.get_friends(b).await.unwrap();
    assert_eq!(from_b.len(), 1);
    assert_eq!(from_b[0].id, a);
    assert_eq!(from_b[0].friendship_id, with_b.id);

    service.unfriend(a, UnfriendTarget::Friendship(with_b.id)).await.unwrap();
    let friends = service.get_friends(a).await.unwrap();
    assert_eq!(friends.len(), 1);
    assert!(friends.iter().all(|f| f.id != b));
}

#[rstest]
#[actix_web::test]
async fn unfriend_twice_is_not_found(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, b) = pair(&store).await;
    let request = service.send_friend_request(a, Some(ReceiverRef::Id(b))).await.unwrap();
    service.respond_to_request(b, request.id, RequestAction::Accept).await.unwrap();

    service.unfriend(b, UnfriendTarget::User(a)).await.unwrap();

    let err = service.unfriend(b, UnfriendTarget::User(a)).await.unwrap_err();
    assert!(matches!(err, FriendError::FriendshipNotFound));
    assert!(matches!(error::Error::from(err), error::Error::NotFound(_)));
}

#[rstest]
#[actix_web::test]
async fn unfriend_by_id_requires_membership(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, b) = pair(&store).await;
    let stranger = seed_user(&store, "shinji", None).await;
    let request = service.send_friend_request(a, Some(ReceiverRef::Id(b))).await.unwrap();
    service.respond_to_request(b, request.id, RequestAction::Accept).await.unwrap();
    let friendship = store.friendships().remove(0);

    let err = service.unfriend(stranger, UnfriendTarget::Friendship(friendship.id)).await;
    assert!(matches!(err, Err(FriendError::NotFriendshipMember)));
    assert_eq!(store.friendships().len(), 1);

    let err = service.unfriend(a, UnfriendTarget::Friendship(Uuid::now_v7())).await;
    assert!(matches!(err, Err(FriendError::FriendshipNotFound)));
}

#[rstest]
#[actix_web::test]
async fn search_by_code(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, b) = pair(&store).await;

    let found = service.find_by_code(a, "4821").await.unwrap();
    assert_eq!(found.id, b);
    assert_eq!(found.friend_code.as_deref(), Some("4821"));

    let missing = service.find_by_code(a, "9999").await.unwrap_err();
    assert!(matches!(missing, FriendError::CodeNotFound));
    assert!(matches!(error::Error::from(missing), error::Error::NotFound(_)));

    let own = service.find_by_code(b, "4821").await.unwrap_err();
    assert!(matches!(own, FriendError::SelfRequest));

    let malformed = service.find_by_code(a, "48-21").await.unwrap_err();
    assert!(matches!(malformed, FriendError::InvalidFriendCode));
}

#[rstest]
#[actix_web::test]
async fn generated_code_is_persisted(store: Arc<MemoryStore>) {
    let service = friend_service(&store);
    let (a, _) = pair(&store).await;

    let code = service.generate_friend_code(a).await.unwrap();

    let owner = service.find_by_code(Uuid::now_v7(), &code).await.unwrap();
    assert_eq!(owner.id, a);
}

#[rstest]
#[actix_web::test]
async fn code_assignment_retries_collisions(store: Arc<MemoryStore>) {
    let (a, _) = pair(&store).await;
    let mut codes = ["4821", "4821", "7777"].into_iter();

    let code = assign_unique_code_with(store.as_ref(), &a, 10, || {
        codes.next().unwrap_or("0000").to_string()
    })
    .await
    .unwrap();

    assert_eq!(code.as_deref(), Some("7777"));
}

#[rstest]
#[actix_web::test]
async fn code_assignment_gives_up(store: Arc<MemoryStore>) {
    let (a, _) = pair(&store).await;
    let mut calls = 0;

    let code = assign_unique_code_with(store.as_ref(), &a, 5, || {
        calls += 1;
        "4821".to_string()
    })
    .await
    .unwrap();

    assert!(code.is_none());
    assert_eq!(calls, 5);
    assert!(matches!(
        error::Error::from(FriendError::ExhaustedAttempts),
        error::Error::InternalServer
    ));
}
