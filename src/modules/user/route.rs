use crate::modules::{media, user::handle::*};
use actix_web::web::{ServiceConfig, scope};

pub fn public_api_configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/auth")
            .service(register)
            .service(login)
            .service(refresh)
            .service(logout)
            .service(oauth_bridge),
    );
}

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/me")
            .service(check_username)
            .service(get_profile)
            .service(update_profile)
            .configure(media::route::configure),
    );
}
