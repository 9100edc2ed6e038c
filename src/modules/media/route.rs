use crate::modules::media::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn public_api_configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/media").service(serve_media));
}

/// Mounted inside the authenticated `/me` scope.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(upload_media);
}
