//! Recipe entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub author_id: i64,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    /// Public URL of the stored recipe image
    #[sea_orm(column_type = "Text")]
    pub image: String,

    /// Minutes, always >= 1
    pub cooking_time: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,

    #[sea_orm(has_many = "super::ingredient_in_recipe::Entity")]
    IngredientInRecipes,

    #[sea_orm(has_many = "super::recipe_relation::Entity")]
    RecipeRelations,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::ingredient_in_recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IngredientInRecipes.def()
    }
}

impl Related<super::recipe_relation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeRelations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
