//! Short-link resolver
//!
//! `/s/{id}/` redirects to the canonical recipe URL, or answers 404 when the
//! recipe no longer exists.

use crate::AppState;
use axum::{
    extract::{Path, State},
    response::Redirect,
};
use foodgram_common::{
    db::Repository,
    errors::{AppError, Result},
};

pub async fn resolve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect> {
    let repo = Repository::new(state.db.clone());

    if !repo.recipe_exists(id).await? {
        return Err(AppError::RecipeNotFound { id });
    }

    Ok(Redirect::to(&format!("/api/recipes/{}/", id)))
}
