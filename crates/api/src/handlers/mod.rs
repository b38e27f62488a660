//! API handlers module

pub mod auth;
pub mod health;
pub mod ingredients;
pub mod recipes;
pub mod shortlink;
pub mod users;
