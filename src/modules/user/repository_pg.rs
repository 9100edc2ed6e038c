use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{
        model::{InsertUser, UpdateUser},
        repository::UserRepository,
        schema::{MediaSlot, UserEntity},
    },
};

#[derive(Clone)]
pub struct UserRepositoryPg {
    pool: sqlx::PgPool,
}

impl UserRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for UserRepositoryPg {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_friend_code(
        &self,
        code: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE friend_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError> {
        let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (id, email, password_hash, auth_provider, email_verified, display_name, avatar_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.auth_provider)
        .bind(user.email_verified)
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update(&self, id: &Uuid, user: &UpdateUser) -> Result<UserEntity, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
        UPDATE users
        SET
            username     = COALESCE($2, username),
            display_name = COALESCE($3, display_name),
            avatar_url   = COALESCE($4, avatar_url),
            banner_url   = COALESCE($5, banner_url),
            bio          = COALESCE($6, bio),
            discord      = COALESCE($7, discord),
            twitch       = COALESCE($8, twitch),
            steam        = COALESCE($9, steam),
            twitter      = COALESCE($10, twitter),
            updated_at   = NOW()
        WHERE id = $1
        RETURNING *
        "#,
        )
        .bind(id)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(&user.banner_url)
        .bind(&user.bio)
        .bind(&user.discord)
        .bind(&user.twitch)
        .bind(&user.steam)
        .bind(&user.twitter)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        Ok(user)
    }

    async fn set_friend_code(&self, id: &Uuid, code: &str) -> Result<(), error::SystemError> {
        let rows =
            sqlx::query("UPDATE users SET friend_code = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(code)
                .execute(&self.pool)
                .await?
                .rows_affected();

        if rows == 0 {
            return Err(error::SystemError::not_found("User not found"));
        }
        Ok(())
    }

    async fn set_media(
        &self,
        id: &Uuid,
        slot: MediaSlot,
        path: &str,
    ) -> Result<(), error::SystemError> {
        let sql = match slot {
            MediaSlot::Avatar => "UPDATE users SET avatar_url = $2, updated_at = NOW() WHERE id = $1",
            MediaSlot::Banner => "UPDATE users SET banner_url = $2, updated_at = NOW() WHERE id = $1",
        };

        let rows = sqlx::query(sql).bind(id).bind(path).execute(&self.pool).await?.rows_affected();

        if rows == 0 {
            return Err(error::SystemError::not_found("User not found"));
        }
        Ok(())
    }
}
