use actix_web::web;

use crate::modules::{
    friend::{handle::*, repository::FriendRepo},
    user::repository::UserRepository,
};

pub fn configure<R, U>(cfg: &mut web::ServiceConfig)
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    cfg.service(
        web::scope("/friends")
            .service(web::resource("").route(web::get().to(list_friends::<R, U>)))
            .service(
                web::resource("/requests")
                    .route(web::get().to(list_friend_requests::<R, U>))
                    .route(web::post().to(send_friend_request::<R, U>)),
            )
            .service(
                web::resource("/requests/{request_id}")
                    .route(web::patch().to(respond_friend_request::<R, U>))
                    .route(web::delete().to(delete_friend_request::<R, U>)),
            )
            .service(
                web::resource("/unfriend/{friendship_id}")
                    .route(web::delete().to(unfriend::<R, U>)),
            )
            .service(web::resource("/search").route(web::get().to(search_by_code::<R, U>)))
            .service(
                web::resource("/code").route(web::post().to(regenerate_friend_code::<R, U>)),
            )
            .service(
                web::resource("/{friend_id:[0-9a-fA-F-]{36}}")
                    .route(web::delete().to(remove_friend::<R, U>)),
            ),
    );
}
