/// Build-in-public posts
///
/// Posts are ingested through the API and keyed by URL, so re-submitting a
/// post refreshes its engagement counters instead of duplicating it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub content: Option<String>,
    pub num_likes: i32,
    pub num_comments: i32,
    pub posted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpsertPost {
    pub user_id: Uuid,

    #[validate(url(message = "Invalid post URL"))]
    pub url: String,

    pub content: Option<String>,

    #[validate(range(min = 0, message = "Likes cannot be negative"))]
    #[serde(default)]
    pub num_likes: i32,

    #[validate(range(min = 0, message = "Comments cannot be negative"))]
    #[serde(default)]
    pub num_comments: i32,

    pub posted_at: DateTime<Utc>,
}

/// Per-user post totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostTotals {
    pub user_id: Uuid,
    pub total_posts: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub last_posted: Option<DateTime<Utc>>,
}

/// Users listed on the build-in-public board
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostAuthorSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub total_posts: i64,
    pub last_posted: Option<DateTime<Utc>>,
    pub total_likes: i64,
    pub total_comments: i64,
}

impl Post {
    /// Inserts a post, or refreshes the stored one with the same URL
    pub async fn upsert<'e, E: PgExecutor<'e>>(
        executor: E,
        data: &UpsertPost,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (user_id, url, content, num_likes, num_comments, posted_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (url) DO UPDATE SET
                content = COALESCE(EXCLUDED.content, posts.content),
                num_likes = EXCLUDED.num_likes,
                num_comments = EXCLUDED.num_comments,
                posted_at = EXCLUDED.posted_at
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(&data.url)
        .bind(&data.content)
        .bind(data.num_likes)
        .bind(data.num_comments)
        .bind(data.posted_at)
        .fetch_one(executor)
        .await
    }

    /// Post timestamps of a user, oldest first
    pub async fn posted_dates<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
    ) -> Result<Vec<DateTime<Utc>>, sqlx::Error> {
        sqlx::query_scalar("SELECT posted_at FROM posts WHERE user_id = $1 ORDER BY posted_at")
            .bind(user_id)
            .fetch_all(executor)
            .await
    }

    /// Post timestamps of a user within `[start, end)`
    pub async fn posted_dates_between<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT posted_at FROM posts
            WHERE user_id = $1 AND posted_at >= $2 AND posted_at < $3
            ORDER BY posted_at
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(executor)
        .await
    }

    /// Totals of every user with at least one post
    pub async fn totals<'e, E: PgExecutor<'e>>(executor: E) -> Result<Vec<PostTotals>, sqlx::Error> {
        sqlx::query_as::<_, PostTotals>(
            r#"
            SELECT user_id,
                   COUNT(*) AS total_posts,
                   COALESCE(SUM(num_likes), 0)::BIGINT AS total_likes,
                   COALESCE(SUM(num_comments), 0)::BIGINT AS total_comments,
                   MAX(posted_at) AS last_posted
            FROM posts
            GROUP BY user_id
            "#,
        )
        .fetch_all(executor)
        .await
    }

    /// Learners with their post totals, most active first
    pub async fn author_summaries<'e, E: PgExecutor<'e>>(
        executor: E,
    ) -> Result<Vec<PostAuthorSummary>, sqlx::Error> {
        sqlx::query_as::<_, PostAuthorSummary>(
            r#"
            SELECT u.id, u.name, u.email,
                   COUNT(p.id) AS total_posts,
                   MAX(p.posted_at) AS last_posted,
                   COALESCE(SUM(p.num_likes), 0)::BIGINT AS total_likes,
                   COALESCE(SUM(p.num_comments), 0)::BIGINT AS total_comments
            FROM users u
            LEFT JOIN posts p ON p.user_id = u.id
            WHERE u.role = 'LEARNER'
            GROUP BY u.id, u.name, u.email
            ORDER BY total_posts DESC, u.name NULLS LAST, u.email
            "#,
        )
        .fetch_all(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_post_validation() {
        let post: UpsertPost = serde_json::from_str(
            r#"{
                "user_id": "00000000-0000-0000-0000-000000000001",
                "url": "https://www.linkedin.com/posts/abc",
                "posted_at": "2025-02-01T10:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(post.num_likes, 0);
        assert!(post.validate().is_ok());

        let bad = UpsertPost {
            url: "linkedin".to_string(),
            num_likes: -1,
            ..post
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("url"));
        assert!(errors.field_errors().contains_key("num_likes"));
    }
}
