//! User entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Text", unique)]
    pub email: String,

    #[sea_orm(column_type = "Text", unique)]
    pub username: String,

    #[sea_orm(column_type = "Text")]
    pub first_name: String,

    #[sea_orm(column_type = "Text")]
    pub last_name: String,

    /// Argon2 PHC string, never serialized to clients
    #[serde(skip_serializing)]
    #[sea_orm(column_type = "Text")]
    pub password_hash: String,

    /// Public URL of the stored avatar image
    #[sea_orm(column_type = "Text", nullable)]
    pub avatar: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Display name used in the shopping-list report
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim().to_string();
        if name.is_empty() {
            self.username.clone()
        } else {
            name
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe::Entity")]
    Recipes,

    #[sea_orm(has_many = "super::auth_token::Entity")]
    AuthTokens,
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipes.def()
    }
}

impl Related<super::auth_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> Model {
        Model {
            id: 1,
            email: "a@b.c".into(),
            username: "vasya".into(),
            first_name: first.into(),
            last_name: last.into(),
            password_hash: String::new(),
            avatar: None,
            created_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn test_full_name() {
        assert_eq!(user("Ivan", "Petrov").full_name(), "Ivan Petrov");
    }

    #[test]
    fn test_full_name_falls_back_to_username() {
        assert_eq!(user("", "").full_name(), "vasya");
    }
}
