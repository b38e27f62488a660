//! Ingredient catalog handlers
//!
//! Read-only and unpaginated: the catalog is small, bounded reference data.

use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use foodgram_common::{
    db::models::Ingredient,
    db::Repository,
    errors::{AppError, Result},
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct IngredientQuery {
    /// Case-sensitive name prefix
    pub name: Option<String>,
}

/// List the catalog, optionally narrowed by a name prefix
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> Result<Json<Vec<Ingredient>>> {
    let repo = Repository::new(state.db.clone());
    let ingredients = repo.list_ingredients(query.name.as_deref()).await?;
    Ok(Json(ingredients))
}

/// Get a single catalog entry
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Ingredient>> {
    let repo = Repository::new(state.db.clone());

    let ingredient = repo
        .find_ingredient_by_id(id)
        .await?
        .ok_or(AppError::IngredientNotFound { id })?;

    Ok(Json(ingredient))
}
