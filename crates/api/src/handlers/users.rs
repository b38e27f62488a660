//! User and subscription handlers

use crate::pagination::{Page, PageQuery};
use crate::schemas::{ShortRecipe, UserProfile, UserWithRecipes};
use crate::AppState;
use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    Json,
};
use foodgram_common::{
    auth::{self, CurrentUser, MaybeUser},
    db::models::User,
    db::Repository,
    errors::{AppError, Result},
    metrics,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(length(min = 1, max = 150))]
    pub first_name: String,

    #[validate(length(min = 1, max = 150))]
    pub last_name: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Registration response; deliberately without the computed profile flags
#[derive(Serialize)]
pub struct RegisterResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    pub avatar: Option<String>,
}

/// Pagination plus the recipe cap used by subscription listings
#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub recipes_limit: Option<u64>,
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let password_hash = auth::hash_password(&request.password)?;

    let user = repo
        .create_user(
            request.email,
            request.username,
            request.first_name,
            request.last_name,
            password_hash,
        )
        .await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }),
    ))
}

/// List users, paginated
pub async fn list_users(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<UserProfile>>> {
    let repo = Repository::new(state.db.clone());

    let page = query.page();
    let limit = query.limit(&state.config.pagination);
    let (users, count) = repo.list_users(page, limit).await?;

    let mut results = Vec::with_capacity(users.len());
    for user in &users {
        let is_subscribed = match &viewer {
            Some(viewer) => repo.is_subscribed(viewer.id, user.id).await?,
            None => false,
        };
        results.push(UserProfile::new(user, is_subscribed));
    }

    let uri = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/api/users/");
    Ok(Json(Page::new(uri, page, limit, count, results)))
}

/// Get a user's public profile
pub async fn get_user(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<UserProfile>> {
    let repo = Repository::new(state.db.clone());

    let user = repo
        .find_user_by_id(id)
        .await?
        .ok_or(AppError::UserNotFound { id })?;

    let is_subscribed = match &viewer {
        Some(viewer) => repo.is_subscribed(viewer.id, user.id).await?,
        None => false,
    };

    Ok(Json(UserProfile::new(&user, is_subscribed)))
}

/// Get the caller's own profile
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    // Never subscribed to oneself
    Json(UserProfile::new(&user, false))
}

/// Change the caller's password
pub async fn set_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<SetPasswordRequest>,
) -> Result<StatusCode> {
    if !auth::verify_password(&request.current_password, &user.password_hash)? {
        return Err(AppError::Validation {
            message: "current password is incorrect".to_string(),
            field: Some("current_password".to_string()),
        });
    }

    if request.new_password.len() < 8 {
        return Err(AppError::Validation {
            message: "password must be at least 8 characters".to_string(),
            field: Some("new_password".to_string()),
        });
    }

    let repo = Repository::new(state.db.clone());
    let password_hash = auth::hash_password(&request.new_password)?;
    repo.update_password_hash(user, password_hash).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Set the caller's avatar from an inline base64 image
pub async fn put_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<AvatarRequest>,
) -> Result<Json<serde_json::Value>> {
    let payload = request
        .avatar
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(AppError::MissingField {
            field: "avatar".to_string(),
        })?;

    let url = state.media.store("users", payload).await?;

    let repo = Repository::new(state.db.clone());
    if let Some(ref old) = user.avatar {
        state.media.remove(old).await;
    }
    repo.update_avatar(user, Some(url.clone())).await?;

    Ok(Json(serde_json::json!({ "avatar": url })))
}

/// Remove the caller's avatar
pub async fn delete_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode> {
    let Some(avatar) = user.avatar.clone() else {
        return Err(AppError::Validation {
            message: "no avatar to delete".to_string(),
            field: Some("avatar".to_string()),
        });
    };

    state.media.remove(&avatar).await;

    let repo = Repository::new(state.db.clone());
    repo.update_avatar(user, None).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Subscriptions
// ============================================================================

/// Build the enriched author payload used by subscription responses
async fn author_with_recipes(
    repo: &Repository,
    author: &User,
    recipes_limit: Option<u64>,
) -> Result<UserWithRecipes> {
    let recipes = repo.recipes_by_author(author.id, recipes_limit).await?;
    let recipes_count = repo.count_recipes_by_author(author.id).await?;

    Ok(UserWithRecipes {
        // Only reachable for authors the caller follows
        profile: UserProfile::new(author, true),
        recipes: recipes.iter().map(ShortRecipe::from).collect(),
        recipes_count,
    })
}

/// List the authors the caller follows
pub async fn subscriptions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<SubscriptionQuery>,
) -> Result<Json<Page<UserWithRecipes>>> {
    let repo = Repository::new(state.db.clone());

    let page_query = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let page = page_query.page();
    let limit = page_query.limit(&state.config.pagination);

    let (authors, count) = repo.list_subscribed_authors(user.id, page, limit).await?;

    let mut results = Vec::with_capacity(authors.len());
    for author in &authors {
        results.push(author_with_recipes(&repo, author, query.recipes_limit).await?);
    }

    let uri = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/api/users/subscriptions/");
    Ok(Json(Page::new(uri, page, limit, count, results)))
}

/// Subscribe to an author
pub async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<SubscriptionQuery>,
) -> Result<(StatusCode, Json<UserWithRecipes>)> {
    let repo = Repository::new(state.db.clone());

    let author = repo
        .find_user_by_id(id)
        .await?
        .ok_or(AppError::UserNotFound { id })?;

    if author.id == user.id {
        return Err(AppError::SelfSubscription);
    }

    repo.add_subscription(user.id, author.id).await?;
    metrics::record_subscription_toggle("subscribe");
    tracing::info!(follower_id = user.id, author_id = author.id, "Subscribed");

    let body = author_with_recipes(&repo, &author, query.recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

/// Unsubscribe from an author
pub async fn unsubscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let repo = Repository::new(state.db.clone());

    let author = repo
        .find_user_by_id(id)
        .await?
        .ok_or(AppError::UserNotFound { id })?;

    repo.remove_subscription(user.id, author.id).await?;
    metrics::record_subscription_toggle("unsubscribe");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            username: "vasya".into(),
            first_name: "Ivan".into(),
            last_name: "Petrov".into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_register_validates_email() {
        assert!(request("not-an-email", "longenough").validate().is_err());
        assert!(request("a@b.example", "longenough").validate().is_ok());
    }

    #[test]
    fn test_register_validates_password_length() {
        assert!(request("a@b.example", "short").validate().is_err());
    }
}
