//! Post storage.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct PostStore {
    pool: SqlitePool,
}

/// Post category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Tech,
    Health,
    Lifestyle,
    Education,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Tech,
        Category::Health,
        Category::Lifestyle,
        Category::Education,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tech => "TECH",
            Category::Health => "HEALTH",
            Category::Lifestyle => "LIFESTYLE",
            Category::Education => "EDUCATION",
        }
    }

    /// Parse the stored form. Unknown values are treated as uncategorized.
    pub fn from_db(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// A stored post.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub category: Option<Category>,
    pub body: String,
    pub created_by: i64,
    pub created_at: String,
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    category: Option<String>,
    body: String,
    created_by: i64,
    created_at: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            category: row.category.as_deref().and_then(Category::from_db),
            body: row.body,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

/// Fields for a new post. The author is passed separately.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub category: Option<Category>,
    pub body: String,
}

/// Partial update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub category: Option<Category>,
    pub body: Option<String>,
}

impl PostStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a post owned by `created_by`. Returns the post ID.
    pub async fn create(&self, created_by: i64, post: &NewPost) -> Result<i64, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO posts (title, category, body, created_by) VALUES (?, ?, ?, ?)")
                .bind(&post.title)
                .bind(post.category.map(|c| c.as_str()))
                .bind(&post.body)
                .bind(created_by)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a post by ID, regardless of owner.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Post>, sqlx::Error> {
        let row: Option<PostRow> = sqlx::query_as(
            "SELECT id, title, category, body, created_by, created_at FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Post::from))
    }

    /// List all posts, oldest first.
    pub async fn list(&self) -> Result<Vec<Post>, sqlx::Error> {
        let rows: Vec<PostRow> = sqlx::query_as(
            "SELECT id, title, category, body, created_by, created_at FROM posts
             ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    /// Apply a partial update. Only touches the post if it belongs to `created_by`.
    /// Returns true if the post was updated.
    pub async fn update(
        &self,
        id: i64,
        created_by: i64,
        changes: &PostChanges,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE posts SET title = COALESCE(?, title), category = COALESCE(?, category), body = COALESCE(?, body)
             WHERE id = ? AND created_by = ?",
        )
        .bind(changes.title.as_deref())
        .bind(changes.category.map(|c| c.as_str()))
        .bind(changes.body.as_deref())
        .bind(id)
        .bind(created_by)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a post. Only deletes if it belongs to `created_by`.
    /// Returns true if the post was deleted.
    pub async fn delete(&self, id: i64, created_by: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ? AND created_by = ?")
            .bind(id)
            .bind(created_by)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
