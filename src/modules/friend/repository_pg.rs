use uuid::Uuid;

use crate::{
    api::error,
    modules::friend::{
        error::FriendError,
        model::{FriendRequestResponse, FriendResponse, FriendUserRow, IdOrInfo},
        repository::{FriendRepo, FriendRepository, FriendRequestRepository},
        schema::{
            FriendPair, FriendRequestEntity, FriendRequestStatus, FriendshipEntity,
            RequestAction, Resolution,
        },
    },
};

#[derive(Clone)]
pub struct FriendRepositoryPg {
    pool: sqlx::PgPool,
}

impl FriendRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_friendship<'e, E>(pair: &FriendPair, tx: E) -> Result<(), error::SystemError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO friendships (id, user1_id, user2_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user1_id, user2_id) DO NOTHING
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(pair.low)
    .bind(pair.high)
    .execute(tx)
    .await?;

    Ok(())
}

#[async_trait::async_trait]
impl FriendRepository for FriendRepositoryPg {
    async fn find_friendship(
        &self,
        pair: &FriendPair,
    ) -> Result<Option<FriendshipEntity>, error::SystemError> {
        let friendship = sqlx::query_as::<_, FriendshipEntity>(
            "SELECT * FROM friendships WHERE user1_id = $1 AND user2_id = $2",
        )
        .bind(pair.low)
        .bind(pair.high)
        .fetch_optional(&self.pool)
        .await?;

        Ok(friendship)
    }

    async fn find_friendship_by_id(
        &self,
        friendship_id: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError> {
        let friendship =
            sqlx::query_as::<_, FriendshipEntity>("SELECT * FROM friendships WHERE id = $1")
                .bind(friendship_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(friendship)
    }

    async fn find_friends_as_user1(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError> {
        let friends = sqlx::query_as::<_, FriendResponse>(
            r#"
        SELECT
            f.id AS friendship_id,
            u.id,
            u.username,
            u.display_name,
            u.avatar_url,
            u.friend_code,
            f.created_at AS friends_since
        FROM friendships f
        JOIN users u ON u.id = f.user2_id
        WHERE f.user1_id = $1
        ORDER BY f.created_at DESC
        "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(friends)
    }

    async fn find_friends_as_user2(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError> {
        let friends = sqlx::query_as::<_, FriendResponse>(
            r#"
        SELECT
            f.id AS friendship_id,
            u.id,
            u.username,
            u.display_name,
            u.avatar_url,
            u.friend_code,
            f.created_at AS friends_since
        FROM friendships f
        JOIN users u ON u.id = f.user1_id
        WHERE f.user2_id = $1
        ORDER BY f.created_at DESC
        "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(friends)
    }

    async fn delete_friendship(&self, friendship_id: &Uuid) -> Result<bool, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query_as::<_, FriendshipEntity>(
            "DELETE FROM friendships WHERE id = $1 RETURNING *",
        )
        .bind(friendship_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(removed) = removed else {
            tx.rollback().await?;
            return Ok(false);
        };

        sqlx::query(
            r#"
            INSERT INTO friendship_removals (user1_id, user2_id, removed_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user1_id, user2_id) DO UPDATE SET removed_at = EXCLUDED.removed_at
            "#,
        )
        .bind(removed.user1_id)
        .bind(removed.user2_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for FriendRepositoryPg {
    async fn find_pending_request(
        &self,
        pair: &FriendPair,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        // same expression the pending-pair unique index is built on
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            SELECT *
            FROM friend_requests
            WHERE LEAST(sender_id, receiver_id) = $1
              AND GREATEST(sender_id, receiver_id) = $2
              AND status = 'pending'
            "#,
        )
        .bind(pair.low)
        .bind(pair.high)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_friend_request_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let request =
            sqlx::query_as::<_, FriendRequestEntity>("SELECT * FROM friend_requests WHERE id = $1")
                .bind(request_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(request)
    }

    async fn find_friend_request_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestResponse>, error::SystemError> {
        let rows = sqlx::query_as::<_, FriendUserRow>(
            r#"
            SELECT
                fr.id AS req_id,
                fr.status,
                fr.created_at,
                u.id AS user_id,
                u.username,
                u.display_name,
                u.avatar_url,
                u.friend_code
            FROM friend_requests fr
            JOIN users u
                ON fr.receiver_id = u.id
            WHERE fr.sender_id = $1
              AND fr.status = 'pending'
            ORDER BY fr.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| FriendRequestResponse {
                id: r.req_id,
                from: IdOrInfo::Id(*user_id),
                to: IdOrInfo::Info(r.other_party()),
                status: r.status,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn find_friend_request_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestResponse>, error::SystemError> {
        let rows = sqlx::query_as::<_, FriendUserRow>(
            r#"
            SELECT
                fr.id AS req_id,
                fr.status,
                fr.created_at,
                u.id AS user_id,
                u.username,
                u.display_name,
                u.avatar_url,
                u.friend_code
            FROM friend_requests fr
            JOIN users u
                ON fr.sender_id = u.id
            WHERE fr.receiver_id = $1
              AND fr.status = 'pending'
            ORDER BY fr.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| FriendRequestResponse {
                id: r.req_id,
                from: IdOrInfo::Info(r.other_party()),
                to: IdOrInfo::Id(*user_id),
                status: r.status,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn create_friend_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            INSERT INTO friend_requests (id, sender_id, receiver_id, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    async fn delete_friend_request(&self, request_id: &Uuid) -> Result<bool, error::SystemError> {
        let rows = sqlx::query("DELETE FROM friend_requests WHERE id = $1")
            .bind(request_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }
}

#[async_trait::async_trait]
impl FriendRepo for FriendRepositoryPg {
    async fn respond_to_request_atomic(
        &self,
        request_id: &Uuid,
        user_id: &Uuid,
        action: RequestAction,
    ) -> Result<FriendRequestEntity, FriendError> {
        let mut tx = self.pool.begin().await?;

        // concurrent responders queue up here
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friend_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(FriendError::RequestNotFound)?;

        let resolution = match request.resolve(user_id, action) {
            Ok(resolution) => resolution,
            Err(e) => {
                tx.rollback().await?;
                return Err(e);
            }
        };

        match resolution {
            Resolution::Reconcile => {
                let pair = request.pair();
                let last_removed = sqlx::query_scalar::<_, chrono::DateTime<chrono::Utc>>(
                    r#"
                    SELECT removed_at
                    FROM friendship_removals
                    WHERE user1_id = $1 AND user2_id = $2
                    "#,
                )
                .bind(pair.low)
                .bind(pair.high)
                .fetch_optional(&mut *tx)
                .await?;

                if request.restores_friendship(last_removed) {
                    insert_friendship(&pair, &mut *tx).await?;
                }
                tx.commit().await?;
                Err(FriendError::AlreadyHandled)
            }
            Resolution::Transition(status) => {
                let updated = sqlx::query_as::<_, FriendRequestEntity>(
                    r#"
                    UPDATE friend_requests
                    SET status = $2, updated_at = NOW()
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(request_id)
                .bind(status)
                .fetch_one(&mut *tx)
                .await?;

                if status == FriendRequestStatus::Accepted {
                    insert_friendship(&request.pair(), &mut *tx).await?;
                }

                tx.commit().await?;
                Ok(updated)
            }
        }
    }
}
