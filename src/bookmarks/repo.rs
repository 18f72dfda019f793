use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub created_at: OffsetDateTime,
}

impl Bookmark {
    /// All bookmarks owned by `user_id`, oldest first.
    pub async fn list_by_owner(db: &PgPool, user_id: Uuid) -> Result<Vec<Bookmark>, sqlx::Error> {
        sqlx::query_as::<_, Bookmark>(
            r#"
            SELECT id, user_id, title, description, url, created_at
            FROM bookmarks
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    /// Fetch scoped by owner. `None` means the bookmark does not exist or
    /// belongs to someone else; callers must not distinguish the two.
    pub async fn find_owned(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Bookmark>, sqlx::Error> {
        sqlx::query_as::<_, Bookmark>(
            r#"
            SELECT id, user_id, title, description, url, created_at
            FROM bookmarks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        title: &str,
        description: Option<&str>,
        url: &str,
    ) -> Result<Bookmark, sqlx::Error> {
        sqlx::query_as::<_, Bookmark>(
            r#"
            INSERT INTO bookmarks (user_id, title, description, url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, description, url, created_at
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(url)
        .fetch_one(db)
        .await
    }

    /// Partial update; absent fields keep their current values. Only called
    /// after [`Bookmark::find_owned`] has confirmed ownership.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        url: Option<&str>,
    ) -> Result<Bookmark, sqlx::Error> {
        sqlx::query_as::<_, Bookmark>(
            r#"
            UPDATE bookmarks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                url = COALESCE($4, url)
            WHERE id = $1
            RETURNING id, user_id, title, description, url, created_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(url)
        .fetch_one(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(r#"DELETE FROM bookmarks WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
