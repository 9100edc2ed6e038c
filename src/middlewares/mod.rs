use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, Error, HttpMessage, HttpRequest,
};

use crate::{
    api::error,
    utils::{Claims, TokenConfig, TypeClaims},
};

/// Resolves the bearer token into [`Claims`] and stores them in the request
/// extensions. Every failure is reported as a plain 401.
pub async fn authentication<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let tokens = req
        .app_data::<web::Data<TokenConfig>>()
        .cloned()
        .ok_or(error::Error::InternalServer)?;

    let auth = req.headers().get("Authorization").and_then(|h| h.to_str().ok());
    let token = match auth.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(t) => t,
        None => {
            return Err(error::Error::unauthorized("Unauthorized").into());
        }
    };

    let claims = Claims::decode(token, tokens.secret.as_bytes())
        .map_err(|_| error::Error::unauthorized("Unauthorized"))?;

    if !claims.is(TypeClaims::AccessToken) {
        return Err(error::Error::unauthorized("Unauthorized").into());
    }

    req.extensions_mut().insert(claims);

    next.call(req).await
}

pub fn get_extensions<T: Clone + 'static>(req: &HttpRequest) -> Result<T, error::Error> {
    let extensions = req.extensions();

    let value =
        extensions.get::<T>().ok_or_else(|| error::Error::unauthorized("Unauthorized"))?.clone();

    Ok(value)
}

/// The authenticated user id for this request.
pub fn current_user(req: &HttpRequest) -> Result<uuid::Uuid, error::Error> {
    Ok(get_extensions::<Claims>(req)?.sub)
}
