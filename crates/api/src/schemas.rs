//! Response schemas shared across handlers
//!
//! `is_subscribed`, `is_favorited`, and `is_in_shopping_cart` are computed
//! per request from the relation tables, never stored.

use foodgram_common::db::models::{Ingredient, Recipe, User};
use foodgram_common::db::IngredientRow;
use serde::Serialize;

/// Public user profile
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserProfile {
    pub fn new(user: &User, is_subscribed: bool) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
            avatar: user.avatar.clone(),
        }
    }
}

/// Summary projection of a recipe (relation toggles, subscription listings)
#[derive(Debug, Clone, Serialize)]
pub struct ShortRecipe {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<&Recipe> for ShortRecipe {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: recipe.image.clone(),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Profile enriched with the author's recipes (subscription responses)
#[derive(Debug, Clone, Serialize)]
pub struct UserWithRecipes {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub recipes: Vec<ShortRecipe>,
    pub recipes_count: u64,
}

/// One ingredient line of a full recipe response
#[derive(Debug, Clone, Serialize)]
pub struct RecipeIngredientOut {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl RecipeIngredientOut {
    pub fn new(ingredient: &Ingredient, amount: i32) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name.clone(),
            measurement_unit: ingredient.measurement_unit.clone(),
            amount,
        }
    }
}

/// Full recipe response
#[derive(Debug, Clone, Serialize)]
pub struct RecipeOut {
    pub id: i64,
    pub author: UserProfile,
    pub ingredients: Vec<RecipeIngredientOut>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

impl RecipeOut {
    pub fn new(
        recipe: &Recipe,
        author: UserProfile,
        rows: &[IngredientRow],
        is_favorited: bool,
        is_in_shopping_cart: bool,
    ) -> Self {
        Self {
            id: recipe.id,
            author,
            ingredients: rows
                .iter()
                .filter(|row| row.entry.recipe_id == recipe.id)
                .map(|row| RecipeIngredientOut::new(&row.ingredient, row.entry.amount))
                .collect(),
            is_favorited,
            is_in_shopping_cart,
            name: recipe.name.clone(),
            image: recipe.image.clone(),
            text: recipe.text.clone(),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_recipe_projection() {
        let recipe = Recipe {
            id: 7,
            author_id: 1,
            name: "Soup".into(),
            text: "Boil it".into(),
            image: "/media/recipes/abc.png".into(),
            cooking_time: 25,
            created_at: chrono::Utc::now().into(),
        };

        let short = ShortRecipe::from(&recipe);
        assert_eq!(short.id, 7);
        assert_eq!(short.name, "Soup");
        assert_eq!(short.cooking_time, 25);
    }
}
