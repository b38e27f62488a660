//! Ingredient catalog entity
//!
//! Reference data loaded in bulk by the `load-ingredients` binary.
//! Unique on (name, measurement_unit).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub measurement_unit: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ingredient_in_recipe::Entity")]
    IngredientInRecipes,
}

impl Related<super::ingredient_in_recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IngredientInRecipes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
