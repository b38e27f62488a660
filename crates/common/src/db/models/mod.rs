//! SeaORM entity models
//!
//! Database entities for the Foodgram backend. Composite uniqueness
//! (ingredient name + unit, relation pairs, subscription pairs) lives in
//! `sql/schema.sql`; the code relies on those constraints surfacing as
//! `SqlErr::UniqueConstraintViolation`.

mod auth_token;
mod ingredient;
mod ingredient_in_recipe;
mod recipe;
mod recipe_relation;
mod subscription;
mod user;

pub use user::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as UserEntity, Model as User,
};

pub use auth_token::{
    ActiveModel as AuthTokenActiveModel, Column as AuthTokenColumn, Entity as AuthTokenEntity,
    Model as AuthToken,
};

pub use ingredient::{
    ActiveModel as IngredientActiveModel, Column as IngredientColumn, Entity as IngredientEntity,
    Model as Ingredient,
};

pub use recipe::{
    ActiveModel as RecipeActiveModel, Column as RecipeColumn, Entity as RecipeEntity,
    Model as Recipe,
};

pub use ingredient_in_recipe::{
    ActiveModel as IngredientInRecipeActiveModel, Column as IngredientInRecipeColumn,
    Entity as IngredientInRecipeEntity, Model as IngredientInRecipe,
};

pub use recipe_relation::{
    ActiveModel as RecipeRelationActiveModel, Column as RecipeRelationColumn,
    Entity as RecipeRelationEntity, Model as RecipeRelation, RelationKind,
};

pub use subscription::{
    ActiveModel as SubscriptionActiveModel, Column as SubscriptionColumn,
    Entity as SubscriptionEntity, Model as Subscription,
};
