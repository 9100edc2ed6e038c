use actix_web::{web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::current_user,
    modules::{
        friend::{
            model::{
                CodeQuery, FriendCodeResponse, FriendsEnvelope, RequestsEnvelope, RespondBody,
                SendRequestBody, SentRequest, UnfriendTarget, UserEnvelope,
            },
            repository::FriendRepo,
            service::FriendService,
        },
        user::repository::UserRepository,
    },
    utils::{ValidatedJson, ValidatedQuery},
};

pub async fn list_friends<R, U>(
    friend_service: web::Data<FriendService<R, U>>,
    req: HttpRequest,
) -> Result<success::Success<FriendsEnvelope>, error::Error>
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = current_user(&req)?;
    let friends = friend_service.get_friends(user_id).await?;

    Ok(success::Success::ok(FriendsEnvelope { friends }))
}

pub async fn list_friend_requests<R, U>(
    friend_service: web::Data<FriendService<R, U>>,
    req: HttpRequest,
) -> Result<success::Success<RequestsEnvelope>, error::Error>
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = current_user(&req)?;
    let requests = friend_service.get_friend_requests(user_id).await?;

    Ok(success::Success::ok(requests))
}

pub async fn send_friend_request<R, U>(
    friend_service: web::Data<FriendService<R, U>>,
    body: ValidatedJson<SendRequestBody>,
    req: HttpRequest,
) -> Result<success::Success<SentRequest>, error::Error>
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let sender_id = current_user(&req)?;
    let request = friend_service.send_friend_request(sender_id, body.0.receiver()).await?;

    Ok(success::Success::created(SentRequest { ok: true, request })
        .message("Friend request sent successfully"))
}

pub async fn respond_friend_request<R, U>(
    friend_service: web::Data<FriendService<R, U>>,
    request_id: web::Path<Uuid>,
    body: ValidatedJson<RespondBody>,
    req: HttpRequest,
) -> Result<success::Success<success::Ack>, error::Error>
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let receiver_id = current_user(&req)?;
    friend_service.respond_to_request(receiver_id, *request_id, body.0.action).await?;

    Ok(success::Success::ack())
}

pub async fn delete_friend_request<R, U>(
    friend_service: web::Data<FriendService<R, U>>,
    request_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<success::Ack>, error::Error>
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = current_user(&req)?;
    friend_service.delete_request(user_id, *request_id).await?;

    Ok(success::Success::ack())
}

pub async fn unfriend<R, U>(
    friend_service: web::Data<FriendService<R, U>>,
    friendship_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<success::Ack>, error::Error>
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = current_user(&req)?;
    friend_service.unfriend(user_id, UnfriendTarget::Friendship(*friendship_id)).await?;

    Ok(success::Success::ack())
}

pub async fn remove_friend<R, U>(
    friend_service: web::Data<FriendService<R, U>>,
    friend_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<success::Ack>, error::Error>
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = current_user(&req)?;
    friend_service.unfriend(user_id, UnfriendTarget::User(*friend_id)).await?;

    Ok(success::Success::ack())
}

pub async fn search_by_code<R, U>(
    friend_service: web::Data<FriendService<R, U>>,
    query: ValidatedQuery<CodeQuery>,
    req: HttpRequest,
) -> Result<success::Success<UserEnvelope>, error::Error>
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = current_user(&req)?;
    let user = friend_service.find_by_code(user_id, &query.0.code).await?;

    Ok(success::Success::ok(UserEnvelope { user }))
}

pub async fn regenerate_friend_code<R, U>(
    friend_service: web::Data<FriendService<R, U>>,
    req: HttpRequest,
) -> Result<success::Success<FriendCodeResponse>, error::Error>
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = current_user(&req)?;
    let friend_code = friend_service.generate_friend_code(user_id).await?;

    Ok(success::Success::ok(FriendCodeResponse { friend_code })
        .message("Friend code generated successfully"))
}
