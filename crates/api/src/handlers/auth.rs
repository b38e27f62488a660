//! Token login/logout handlers
//!
//! Thin auth boundary: opaque tokens, stored hashed. Everything else in the
//! API only ever sees `CurrentUser` / `MaybeUser`.

use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use foodgram_common::{
    auth::{self, AuthContext},
    db::Repository,
    errors::{AppError, Result},
};
use axum::Extension;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub auth_token: String,
}

/// Exchange credentials for an opaque token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let repo = Repository::new(state.db.clone());

    let user = repo
        .find_user_by_email(&request.email)
        .await?
        .ok_or_else(bad_credentials)?;

    if !auth::verify_password(&request.password, &user.password_hash)? {
        return Err(bad_credentials());
    }

    let token = auth::generate_token();
    repo.create_token(user.id, auth::hash_token(&token)).await?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse { auth_token: token }))
}

/// Invalidate the presented token
pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<StatusCode> {
    let Some(token_hash) = ctx.token_hash else {
        return Err(AppError::Unauthorized {
            message: "authentication credentials were not provided".to_string(),
        });
    };

    let repo = Repository::new(state.db.clone());
    repo.delete_token(&token_hash).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn bad_credentials() -> AppError {
    AppError::Unauthorized {
        message: "unable to log in with the provided credentials".to_string(),
    }
}
