//! Recipe handlers
//!
//! Covers recipe CRUD, the favorite/shopping-cart toggles, the short-link
//! endpoint, and the shopping-list download.

use crate::pagination::{Page, PageQuery};
use crate::schemas::{RecipeOut, ShortRecipe, UserProfile};
use crate::AppState;
use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use foodgram_common::{
    auth::{CurrentUser, MaybeUser},
    db::models::{RelationKind, User},
    db::{RecipeFilter, Repository},
    errors::{AppError, Result},
    metrics, shopping,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use validator::Validate;

/// One ingredient reference in a submitted recipe
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct IngredientRef {
    pub id: i64,

    #[validate(range(min = 1, message = "amount must be a positive integer"))]
    pub amount: i32,
}

/// Recipe create/update payload
#[derive(Debug, Deserialize, Validate)]
pub struct RecipePayload {
    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(length(min = 1))]
    pub text: String,

    /// Inline base64 image; required on create, optional on update
    pub image: Option<String>,

    #[validate(range(min = 1, message = "cooking time must be a positive integer"))]
    pub cooking_time: i32,

    #[validate(length(min = 1, message = "at least one ingredient is required"), nested)]
    pub ingredients: Vec<IngredientRef>,
}

/// Filters and pagination for the recipe list
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub author: Option<i64>,
    pub is_favorited: Option<u8>,
    pub is_in_shopping_cart: Option<u8>,
}

/// Reject payloads naming the same ingredient twice.
/// Runs before anything is persisted.
fn check_distinct_ids(ingredients: &[IngredientRef]) -> Result<()> {
    let mut seen = HashSet::new();
    for ingredient in ingredients {
        if !seen.insert(ingredient.id) {
            return Err(AppError::Validation {
                message: "ingredients must not repeat".to_string(),
                field: Some("ingredients".to_string()),
            });
        }
    }
    Ok(())
}

/// Validate the payload shape and that every referenced ingredient exists
async fn validate_payload(repo: &Repository, payload: &RecipePayload) -> Result<Vec<(i64, i32)>> {
    payload.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    check_distinct_ids(&payload.ingredients)?;

    let ids: Vec<i64> = payload.ingredients.iter().map(|i| i.id).collect();
    let found = repo.find_ingredients_by_ids(&ids).await?;

    if found.len() != ids.len() {
        let known: HashSet<i64> = found.iter().map(|i| i.id).collect();
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !known.contains(id))
            .map(|id| id.to_string())
            .collect();
        return Err(AppError::Validation {
            message: format!("unknown ingredient ids: {}", missing.join(", ")),
            field: Some("ingredients".to_string()),
        });
    }

    Ok(payload
        .ingredients
        .iter()
        .map(|i| (i.id, i.amount))
        .collect())
}

/// Assemble full responses for a batch of recipes with per-request flags
async fn compose_recipes(
    repo: &Repository,
    recipes: &[foodgram_common::db::models::Recipe],
    viewer: Option<&User>,
) -> Result<Vec<RecipeOut>> {
    let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
    let rows = repo.ingredient_rows_for_recipes(&ids).await?;

    let (favorited, in_cart) = match viewer {
        Some(user) => (
            repo.related_subset(user.id, RelationKind::Favorite, &ids).await?,
            repo.related_subset(user.id, RelationKind::ShoppingCart, &ids).await?,
        ),
        None => (HashSet::new(), HashSet::new()),
    };

    let mut authors: HashMap<i64, User> = HashMap::new();
    let mut subscribed: HashSet<i64> = HashSet::new();
    for recipe in recipes {
        if let std::collections::hash_map::Entry::Vacant(entry) = authors.entry(recipe.author_id) {
            let author = repo
                .find_user_by_id(recipe.author_id)
                .await?
                .ok_or(AppError::UserNotFound {
                    id: recipe.author_id,
                })?;
            if let Some(user) = viewer {
                if repo.is_subscribed(user.id, author.id).await? {
                    subscribed.insert(author.id);
                }
            }
            entry.insert(author);
        }
    }

    Ok(recipes
        .iter()
        .map(|recipe| {
            let author = &authors[&recipe.author_id];
            RecipeOut::new(
                recipe,
                UserProfile::new(author, subscribed.contains(&author.id)),
                &rows,
                favorited.contains(&recipe.id),
                in_cart.contains(&recipe.id),
            )
        })
        .collect())
}

/// List recipes, newest first, with filters and pagination
pub async fn list_recipes(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<Page<RecipeOut>>> {
    let repo = Repository::new(state.db.clone());

    // Relation filters only make sense for an authenticated caller
    let mut filter = RecipeFilter {
        author: query.author,
        ..Default::default()
    };
    if let Some(user) = &viewer {
        if query.is_favorited == Some(1) {
            filter.favorited_by = Some(user.id);
        }
        if query.is_in_shopping_cart == Some(1) {
            filter.in_cart_of = Some(user.id);
        }
    }

    let page_query = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let page = page_query.page();
    let limit = page_query.limit(&state.config.pagination);

    let (recipes, count) = repo.list_recipes(&filter, page, limit).await?;
    let results = compose_recipes(&repo, &recipes, viewer.as_ref()).await?;

    let uri = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/api/recipes/");
    Ok(Json(Page::new(uri, page, limit, count, results)))
}

/// Create a recipe (authenticated)
pub async fn create_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<RecipePayload>,
) -> Result<(StatusCode, Json<RecipeOut>)> {
    let repo = Repository::new(state.db.clone());

    let entries = validate_payload(&repo, &payload).await?;

    let image = payload.image.as_deref().filter(|s| !s.is_empty()).ok_or(
        AppError::MissingField {
            field: "image".to_string(),
        },
    )?;
    let image_url = state.media.store("recipes", image).await?;

    let recipe = repo
        .create_recipe(
            user.id,
            payload.name,
            payload.text,
            image_url,
            payload.cooking_time,
            entries,
        )
        .await?;

    metrics::record_recipe_created();
    tracing::info!(recipe_id = recipe.id, author_id = user.id, "Recipe created");

    let out = compose_recipes(&repo, std::slice::from_ref(&recipe), Some(&user))
        .await?
        .remove(0);
    Ok((StatusCode::CREATED, Json(out)))
}

/// Get a single recipe
pub async fn get_recipe(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<RecipeOut>> {
    let repo = Repository::new(state.db.clone());

    let recipe = repo
        .find_recipe_by_id(id)
        .await?
        .ok_or(AppError::RecipeNotFound { id })?;

    let out = compose_recipes(&repo, std::slice::from_ref(&recipe), viewer.as_ref())
        .await?
        .remove(0);
    Ok(Json(out))
}

/// Update a recipe (author only). The ingredient set is replaced wholesale
/// inside one transaction; the image is kept when the payload omits it.
pub async fn update_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RecipePayload>,
) -> Result<Json<RecipeOut>> {
    let repo = Repository::new(state.db.clone());

    let recipe = repo
        .find_recipe_by_id(id)
        .await?
        .ok_or(AppError::RecipeNotFound { id })?;

    if recipe.author_id != user.id {
        return Err(AppError::Forbidden {
            message: "only the author can modify a recipe".to_string(),
        });
    }

    let entries = validate_payload(&repo, &payload).await?;

    let image_url = match payload.image.as_deref().filter(|s| !s.is_empty()) {
        Some(image) => state.media.store("recipes", image).await?,
        None => recipe.image.clone(),
    };

    let updated = repo
        .update_recipe(
            recipe,
            payload.name,
            payload.text,
            image_url,
            payload.cooking_time,
            entries,
        )
        .await?;

    let out = compose_recipes(&repo, std::slice::from_ref(&updated), Some(&user))
        .await?
        .remove(0);
    Ok(Json(out))
}

/// Delete a recipe (author only)
pub async fn delete_recipe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let repo = Repository::new(state.db.clone());

    let recipe = repo
        .find_recipe_by_id(id)
        .await?
        .ok_or(AppError::RecipeNotFound { id })?;

    if recipe.author_id != user.id {
        return Err(AppError::Forbidden {
            message: "only the author can delete a recipe".to_string(),
        });
    }

    repo.delete_recipe(id).await?;
    tracing::info!(recipe_id = id, author_id = user.id, "Recipe deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Relation toggles (Favorite / ShoppingCart)
// ============================================================================

fn metric_kind(kind: RelationKind) -> &'static str {
    match kind {
        RelationKind::Favorite => "favorite",
        RelationKind::ShoppingCart => "shopping_cart",
    }
}

/// Generic "add relation" half of the toggle: 404 on a missing recipe,
/// 409 on a duplicate pair, 201 with the short projection on success.
async fn add_relation(
    state: &AppState,
    user: &User,
    recipe_id: i64,
    kind: RelationKind,
) -> Result<(StatusCode, Json<ShortRecipe>)> {
    let repo = Repository::new(state.db.clone());

    let recipe = repo
        .find_recipe_by_id(recipe_id)
        .await?
        .ok_or(AppError::RecipeNotFound { id: recipe_id })?;

    repo.add_relation(user.id, recipe.id, kind).await?;
    metrics::record_relation_toggle(metric_kind(kind), "add");

    Ok((StatusCode::CREATED, Json(ShortRecipe::from(&recipe))))
}

/// Generic "remove relation" half: 404 on a missing recipe or pair, 204 on
/// success.
async fn remove_relation(
    state: &AppState,
    user: &User,
    recipe_id: i64,
    kind: RelationKind,
) -> Result<StatusCode> {
    let repo = Repository::new(state.db.clone());

    if !repo.recipe_exists(recipe_id).await? {
        return Err(AppError::RecipeNotFound { id: recipe_id });
    }

    repo.remove_relation(user.id, recipe_id, kind).await?;
    metrics::record_relation_toggle(metric_kind(kind), "remove");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<ShortRecipe>)> {
    add_relation(&state, &user, id, RelationKind::Favorite).await
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    remove_relation(&state, &user, id, RelationKind::Favorite).await
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<ShortRecipe>)> {
    add_relation(&state, &user, id, RelationKind::ShoppingCart).await
}

pub async fn remove_from_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    remove_relation(&state, &user, id, RelationKind::ShoppingCart).await
}

// ============================================================================
// Short link
// ============================================================================

/// Return the absolute short URL for a recipe
pub async fn get_short_link(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let repo = Repository::new(state.db.clone());

    if !repo.recipe_exists(id).await? {
        return Err(AppError::RecipeNotFound { id });
    }

    let short_url = format!(
        "{}/s/{}/",
        state.config.server.base_url.trim_end_matches('/'),
        id
    );
    Ok(Json(serde_json::json!({ "short-link": short_url })))
}

// ============================================================================
// Shopping-list download
// ============================================================================

/// Download the aggregated shopping list as a text attachment.
/// An empty cart still yields a 200 with an explicit "no items" line.
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response> {
    let repo = Repository::new(state.db.clone());

    let recipes = repo.cart_recipes(user.id).await?;
    let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
    let rows = repo.ingredient_rows_for_recipes(&ids).await?;

    let items = shopping::aggregate(&rows);

    let mut authors: HashMap<i64, User> = HashMap::new();
    let mut report_recipes = Vec::with_capacity(recipes.len());
    for recipe in &recipes {
        if !authors.contains_key(&recipe.author_id) {
            let author = repo
                .find_user_by_id(recipe.author_id)
                .await?
                .ok_or(AppError::UserNotFound {
                    id: recipe.author_id,
                })?;
            authors.insert(recipe.author_id, author);
        }
        report_recipes.push(shopping::ReportRecipe {
            name: recipe.name.clone(),
            author: authors[&recipe.author_id].full_name(),
        });
    }

    let report = shopping::render_report(&user.username, chrono::Utc::now(), &items, &report_recipes);
    metrics::record_shopping_list_download();

    let headers = [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"shopping_list.txt\"",
        ),
    ];
    Ok((headers, report).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(id: i64, amount: i32) -> IngredientRef {
        IngredientRef { id, amount }
    }

    #[test]
    fn test_duplicate_ingredient_ids_rejected() {
        let err = check_distinct_ids(&[ingredient(1, 2), ingredient(1, 3)]).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_distinct_ids_accepted() {
        assert!(check_distinct_ids(&[ingredient(1, 2), ingredient(2, 3)]).is_ok());
    }

    #[test]
    fn test_payload_requires_ingredients() {
        let payload = RecipePayload {
            name: "Soup".into(),
            text: "Boil it".into(),
            image: Some("data:image/png;base64,AAAA".into()),
            cooking_time: 10,
            ingredients: vec![],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_payload_rejects_non_positive_numbers() {
        let payload = RecipePayload {
            name: "Soup".into(),
            text: "Boil it".into(),
            image: None,
            cooking_time: 0,
            ingredients: vec![ingredient(1, 1)],
        };
        assert!(payload.validate().is_err());

        let payload = RecipePayload {
            name: "Soup".into(),
            text: "Boil it".into(),
            image: None,
            cooking_time: 10,
            ingredients: vec![ingredient(1, 0)],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_payload_deserializes_from_wire_shape() {
        let json = serde_json::json!({
            "name": "Soup",
            "text": "Boil it",
            "image": "data:image/png;base64,AAAA",
            "cooking_time": 10,
            "ingredients": [{"id": 1, "amount": 2}, {"id": 2, "amount": 3}]
        });

        let payload: RecipePayload = serde_json::from_value(json).unwrap();
        assert_eq!(payload.ingredients.len(), 2);
        assert!(payload.validate().is_ok());
        assert!(check_distinct_ids(&payload.ingredients).is_ok());
    }
}
