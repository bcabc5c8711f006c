//! Posts API.
//!
//! Reads are public. Creating requires authentication; updating and deleting
//! additionally require ownership of the post.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::error::{ApiError, ResultExt, parse_id};
use super::response::ApiResponse;
use crate::auth::Auth;
use crate::db::{Category, Database, NewPost, Post, PostChanges};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

const MAX_TITLE_LENGTH: usize = 255;
const MAX_BODY_LENGTH: usize = 2047;

/// State for posts endpoints.
#[derive(Clone)]
pub struct PostsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub secure_cookies: bool,
}

impl_has_auth_backend!(PostsState);

pub fn router(state: PostsState) -> Router {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route(
            "/{id}",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .with_state(state)
}

// --- Request types ---

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CreatePostRequest {
    title: String,
    body: String,
    category: Option<Category>,
}

/// `created_by` and `id` are not accepted here; the author never changes.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdatePostRequest {
    title: Option<String>,
    body: Option<String>,
    category: Option<Category>,
}

// --- Helpers ---

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::validation("Title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ApiError::validation(format!(
            "Title cannot be longer than {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

fn validate_body(body: &str) -> Result<(), ApiError> {
    if body.trim().is_empty() {
        return Err(ApiError::validation("Body cannot be empty"));
    }
    if body.chars().count() > MAX_BODY_LENGTH {
        return Err(ApiError::validation(format!(
            "Body cannot be longer than {} characters",
            MAX_BODY_LENGTH
        )));
    }
    Ok(())
}

impl CreatePostRequest {
    fn into_new_post(self) -> Result<NewPost, ApiError> {
        validate_title(&self.title)?;
        validate_body(&self.body)?;
        Ok(NewPost {
            title: self.title,
            category: self.category,
            body: self.body,
        })
    }
}

impl UpdatePostRequest {
    fn into_changes(self) -> Result<PostChanges, ApiError> {
        if self.title.is_none() && self.body.is_none() && self.category.is_none() {
            return Err(ApiError::validation("No fields to update"));
        }
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(body) = &self.body {
            validate_body(body)?;
        }
        Ok(PostChanges {
            title: self.title,
            category: self.category,
            body: self.body,
        })
    }
}

#[derive(Clone, Copy)]
enum Action {
    Update,
    Delete,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// Load a post and check that `user_id` owns it.
/// A missing post is reported before ownership, so 404 reveals nothing about the author.
async fn load_owned_post(
    db: &Database,
    id: i64,
    user_id: i64,
    action: Action,
) -> Result<Post, ApiError> {
    let post = db
        .posts()
        .get_by_id(id)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| not_found(id))?;

    if post.created_by != user_id {
        warn!(
            post_id = id,
            user_id,
            owner_id = post.created_by,
            "Rejected {} of post owned by another user",
            action.verb()
        );
        return Err(ApiError::forbidden(format!(
            "You are not authorized to {} this post",
            action.verb()
        )));
    }

    Ok(post)
}

fn not_found(id: i64) -> ApiError {
    ApiError::not_found(format!("Post with ID: {} not found", id))
}

// --- Handlers ---

async fn list_posts(State(state): State<PostsState>) -> Result<impl IntoResponse, ApiError> {
    let posts = state
        .db
        .posts()
        .list()
        .await
        .db_err("Failed to list posts")?;

    Ok(ApiResponse::message("Posts retrieved successfully").with_data(posts))
}

async fn get_post(
    State(state): State<PostsState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id)?;

    let post = state
        .db
        .posts()
        .get_by_id(id)
        .await
        .db_err("Failed to get post")?
        .ok_or_else(|| not_found(id))?;

    Ok(ApiResponse::message(format!("Post with ID: {} retrieved successfully", id)).with_data(post))
}

async fn create_post(
    State(state): State<PostsState>,
    Auth(grant): Auth,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let new_post = payload.into_new_post()?;

    let id = state
        .db
        .posts()
        .create(grant.user_id, &new_post)
        .await
        .db_err("Failed to create post")?;

    let post = state
        .db
        .posts()
        .get_by_id(id)
        .await
        .db_err("Failed to get created post")?
        .ok_or_else(|| ApiError::internal("Database error"))?;

    info!(post_id = id, user_id = grant.user_id, "Post created");

    Ok((
        StatusCode::CREATED,
        ApiResponse::message("Post created successfully")
            .with_data(post)
            .renewed(&grant),
    ))
}

async fn update_post(
    State(state): State<PostsState>,
    Auth(grant): Auth,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id)?;
    let Json(payload) = payload?;
    let changes = payload.into_changes()?;

    load_owned_post(&state.db, id, grant.user_id, Action::Update).await?;

    let updated = state
        .db
        .posts()
        .update(id, grant.user_id, &changes)
        .await
        .db_err("Failed to update post")?;
    if !updated {
        return Err(not_found(id));
    }

    let post = state
        .db
        .posts()
        .get_by_id(id)
        .await
        .db_err("Failed to get updated post")?
        .ok_or_else(|| not_found(id))?;

    info!(post_id = id, user_id = grant.user_id, "Post updated");

    Ok(
        ApiResponse::message(format!("Post with ID: {} updated successfully", id))
            .with_data(post)
            .renewed(&grant),
    )
}

async fn delete_post(
    State(state): State<PostsState>,
    Auth(grant): Auth,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id)?;

    load_owned_post(&state.db, id, grant.user_id, Action::Delete).await?;

    let deleted = state
        .db
        .posts()
        .delete(id, grant.user_id)
        .await
        .db_err("Failed to delete post")?;
    if !deleted {
        return Err(not_found(id));
    }

    info!(post_id = id, user_id = grant.user_id, "Post deleted");

    Ok(ApiResponse::message(format!("Post with ID: {} deleted successfully", id)).renewed(&grant))
}
