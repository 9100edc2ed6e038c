use actix_web::{
    HttpRequest,
    cookie::{Cookie, time},
    get, patch, post, web,
};

use crate::constants::{BRIDGE_SECRET_HEADER, REFRESH_COOKIE};
use crate::middlewares::current_user;
use crate::modules::user::{model, service::UserService};
use crate::{
    api::{error, success},
    utils::{ValidatedJson, ValidatedQuery},
};

fn refresh_cookie(token: String, ttl: u64) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, token)
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(ttl as i64))
        .finish()
}

fn session(
    user_service: &UserService,
    (access_token, refresh_token): (String, String),
) -> success::Success<model::SignInResponse> {
    success::Success::ok(model::SignInResponse { access_token })
        .cookies(vec![refresh_cookie(refresh_token, user_service.refresh_ttl())])
}

#[post("/register")]
pub async fn register(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::RegisterModel>,
) -> Result<success::Success<model::RegisterResponse>, error::Error> {
    let user = user_service.register(user_data.0).await?;
    Ok(success::Success::created(user).message("Registration successful"))
}

#[post("/login")]
pub async fn login(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignInModel>,
) -> Result<success::Success<model::SignInResponse>, error::Error> {
    let tokens = user_service.sign_in(user_data.0).await?;
    Ok(session(&user_service, tokens).message("Signin successful"))
}

#[post("/refresh")]
pub async fn refresh(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::SignInResponse>, error::Error> {
    let refresh_token = req.cookie(REFRESH_COOKIE).map(|c| c.value().to_string());
    let tokens = user_service.refresh(refresh_token).await?;
    Ok(session(&user_service, tokens).message("Refresh successful"))
}

#[post("/logout")]
pub async fn logout() -> success::Success<success::Ack> {
    let cleared = Cookie::build(REFRESH_COOKIE, "")
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(0))
        .expires(time::OffsetDateTime::UNIX_EPOCH)
        .finish();

    success::Success::ack().cookies(vec![cleared])
}

/// Called by the external auth library once an OAuth handshake completes.
#[post("/oauth")]
pub async fn oauth_bridge(
    user_service: web::Data<UserService>,
    bridge: web::Data<model::OAuthBridgeConfig>,
    req: HttpRequest,
    profile: ValidatedJson<model::OAuthProfileModel>,
) -> Result<success::Success<model::SignInResponse>, error::Error> {
    let presented = req.headers().get(BRIDGE_SECRET_HEADER).and_then(|h| h.to_str().ok());
    bridge.accepts(presented)?;

    let tokens = user_service.oauth_sign_in(profile.0).await?;
    Ok(session(&user_service, tokens))
}

#[get("/profile")]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::ProfileEnvelope>, error::Error> {
    let id = current_user(&req)?;
    let profile = user_service.get_profile(id).await?;
    Ok(success::Success::ok(model::ProfileEnvelope { profile }))
}

#[patch("/profile")]
pub async fn update_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    user_data: ValidatedJson<model::UpdateProfileModel>,
) -> Result<success::Success<success::Ack>, error::Error> {
    let id = current_user(&req)?;
    user_service.update_profile(id, user_data.0).await?;
    Ok(success::Success::ack().message("Profile updated successfully"))
}

#[get("/profile/username")]
pub async fn check_username(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    query: ValidatedQuery<model::UsernameQuery>,
) -> Result<success::Success<model::UsernameAvailability>, error::Error> {
    let id = current_user(&req)?;
    let availability = user_service.username_availability(id, &query.0.username).await?;
    Ok(success::Success::ok(availability))
}
