use std::sync::Arc;

use rstest::fixture;
use uuid::Uuid;

use crate::modules::{
    friend::service::FriendService,
    media::storage::LocalMediaStorage,
    user::{model::InsertUser, repository::UserRepository, schema::AuthProvider},
};
use crate::utils::TokenConfig;

mod friend;

pub use memory::MemoryStore;

pub type MemoryFriendService = FriendService<MemoryStore, MemoryStore>;

#[fixture]
pub fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::default())
}

#[fixture]
pub fn tokens() -> TokenConfig {
    TokenConfig { secret: "test-secret".into(), access_ttl: 900, refresh_ttl: 3600 }
}

pub fn media_storage() -> LocalMediaStorage {
    let root = std::env::temp_dir().join(format!("anime-social-test-{}", Uuid::now_v7()));
    LocalMediaStorage::new(root, "http://localhost:8080/api/media", "media-secret")
}

pub fn friend_service(store: &Arc<MemoryStore>) -> MemoryFriendService {
    FriendService::with_dependencies(store.clone(), store.clone())
}

/// Inserts a user directly, optionally holding `code`.
pub async fn seed_user(store: &MemoryStore, name: &str, code: Option<&str>) -> Uuid {
    let user = store
        .create(&InsertUser {
            email: format!("{name}@example.com"),
            password_hash: None,
            auth_provider: AuthProvider::Google,
            email_verified: true,
            display_name: Some(name.to_string()),
            avatar_url: None,
        })
        .await
        .unwrap();

    if let Some(code) = code {
        store.set_friend_code(&user.id, code).await.unwrap();
    }
    user.id
}
