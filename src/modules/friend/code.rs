//! Friend codes: short public identifiers users share to be found.

use rand::Rng;
use uuid::Uuid;

use crate::{api::error::SystemError, modules::user::repository::UserRepository};

pub const FRIEND_CODE_LENGTH: usize = 6;
const USER_FRIEND_CODE_CONSTRAINT: &str = "users_friend_code_key";

pub fn generate_friend_code() -> String {
    let mut rng = rand::thread_rng();
    (0..FRIEND_CODE_LENGTH).map(|_| char::from(b'0' + rng.gen_range(0..10u8))).collect()
}

/// 4 to 8 ASCII letters or digits. Matching is exact, so case matters.
pub fn is_valid_friend_code(code: &str) -> bool {
    (4..=8).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Gives `user_id` a friend code nobody else holds, retrying on collision.
/// Returns `None` once `max_attempts` codes have all collided.
pub async fn assign_unique_code<U>(
    users: &U,
    user_id: &Uuid,
    max_attempts: usize,
) -> Result<Option<String>, SystemError>
where
    U: UserRepository + ?Sized,
{
    assign_unique_code_with(users, user_id, max_attempts, generate_friend_code).await
}

pub async fn assign_unique_code_with<U, G>(
    users: &U,
    user_id: &Uuid,
    max_attempts: usize,
    mut next_code: G,
) -> Result<Option<String>, SystemError>
where
    U: UserRepository + ?Sized,
    G: FnMut() -> String,
{
    for _ in 0..max_attempts {
        let code = next_code();

        if users.find_by_friend_code(&code).await?.is_some() {
            continue;
        }

        // another writer may take the code between the check and the update
        match users.set_friend_code(user_id, &code).await {
            Ok(()) => return Ok(Some(code)),
            Err(e) if e.violates(USER_FRIEND_CODE_CONSTRAINT) => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(None)
}
