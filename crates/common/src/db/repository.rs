//! Repository pattern for database operations
//!
//! All data access goes through here. Relation uniqueness is delegated to
//! database constraints: a racing duplicate insert comes back as a unique
//! violation and is mapped to Conflict instead of surfacing as a 500.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{on_unique_violation, AppError, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionError, TransactionTrait,
};
use std::collections::HashSet;

/// One ingredient entry of a recipe joined with its catalog row
#[derive(Debug, Clone)]
pub struct IngredientRow {
    pub entry: IngredientInRecipe,
    pub ingredient: Ingredient,
}

/// Filters accepted by the recipe list endpoint
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// Only recipes by this author
    pub author: Option<i64>,

    /// Only recipes favorited by this user
    pub favorited_by: Option<i64>,

    /// Only recipes in this user's shopping cart
    pub in_cart_of: Option<i64>,
}

fn txn_err(err: TransactionError<DbErr>) -> AppError {
    match err {
        TransactionError::Connection(e) => AppError::Database(e),
        TransactionError::Transaction(e) => AppError::Database(e),
    }
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a new user; duplicate email or username maps to Conflict
    pub async fn create_user(
        &self,
        email: String,
        username: String,
        first_name: String,
        last_name: String,
        password_hash: String,
    ) -> Result<User> {
        let user = UserActiveModel {
            email: Set(email.clone()),
            username: Set(username.clone()),
            first_name: Set(first_name),
            last_name: Set(last_name),
            password_hash: Set(password_hash),
            avatar: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        user.insert(self.write_conn()).await.map_err(|e| {
            on_unique_violation(
                e,
                AppError::Duplicate {
                    message: format!(
                        "user with email {} or username {} already exists",
                        email, username
                    ),
                },
            )
        })
    }

    /// Find user by ID
    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find user by email (login)
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List users ordered by username, with total count
    pub async fn list_users(&self, page: u64, limit: u64) -> Result<(Vec<User>, u64)> {
        let paginator = UserEntity::find()
            .order_by_asc(UserColumn::Username)
            .paginate(self.read_conn(), limit);

        let count = paginator.num_items().await?;
        let users = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((users, count))
    }

    /// Replace the user's avatar URL (None clears it)
    pub async fn update_avatar(&self, user: User, avatar: Option<String>) -> Result<User> {
        let mut active: UserActiveModel = user.into();
        active.avatar = Set(avatar);
        active.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Replace the user's password hash
    pub async fn update_password_hash(&self, user: User, password_hash: String) -> Result<User> {
        let mut active: UserActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.update(self.write_conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Auth Token Operations
    // ========================================================================

    /// Store a new token hash for a user
    pub async fn create_token(&self, user_id: i64, token_hash: String) -> Result<AuthToken> {
        let token = AuthTokenActiveModel {
            user_id: Set(user_id),
            token_hash: Set(token_hash),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        token.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Resolve a token hash to its user
    pub async fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<User>> {
        let token = AuthTokenEntity::find()
            .filter(AuthTokenColumn::TokenHash.eq(token_hash))
            .one(self.read_conn())
            .await?;

        match token {
            Some(token) => self.find_user_by_id(token.user_id).await,
            None => Ok(None),
        }
    }

    /// Delete the token with the given hash (logout)
    pub async fn delete_token(&self, token_hash: &str) -> Result<()> {
        AuthTokenEntity::delete_many()
            .filter(AuthTokenColumn::TokenHash.eq(token_hash))
            .exec(self.write_conn())
            .await?;
        Ok(())
    }

    // ========================================================================
    // Ingredient Catalog Operations
    // ========================================================================

    /// List the catalog, optionally narrowed by a case-sensitive name prefix.
    /// Unpaginated: the catalog is assumed small and bounded.
    pub async fn list_ingredients(&self, name_prefix: Option<&str>) -> Result<Vec<Ingredient>> {
        let mut query = IngredientEntity::find().order_by_asc(IngredientColumn::Id);

        if let Some(prefix) = name_prefix {
            query = query.filter(IngredientColumn::Name.starts_with(prefix));
        }

        query.all(self.read_conn()).await.map_err(Into::into)
    }

    /// Find ingredient by ID
    pub async fn find_ingredient_by_id(&self, id: i64) -> Result<Option<Ingredient>> {
        IngredientEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find the subset of `ids` that exists in the catalog
    pub async fn find_ingredients_by_ids(&self, ids: &[i64]) -> Result<Vec<Ingredient>> {
        IngredientEntity::find()
            .filter(IngredientColumn::Id.is_in(ids.iter().copied()))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Get or create a catalog entry; returns true when a row was created.
    /// Used by the seed loader.
    pub async fn get_or_create_ingredient(
        &self,
        name: &str,
        measurement_unit: &str,
    ) -> Result<(Ingredient, bool)> {
        let existing = IngredientEntity::find()
            .filter(IngredientColumn::Name.eq(name))
            .filter(IngredientColumn::MeasurementUnit.eq(measurement_unit))
            .one(self.read_conn())
            .await?;

        if let Some(ingredient) = existing {
            return Ok((ingredient, false));
        }

        let created = IngredientActiveModel {
            name: Set(name.to_string()),
            measurement_unit: Set(measurement_unit.to_string()),
            ..Default::default()
        }
        .insert(self.write_conn())
        .await?;

        Ok((created, true))
    }

    // ========================================================================
    // Recipe Operations
    // ========================================================================

    /// Create a recipe together with its ingredient entries, atomically
    pub async fn create_recipe(
        &self,
        author_id: i64,
        name: String,
        text: String,
        image: String,
        cooking_time: i32,
        entries: Vec<(i64, i32)>,
    ) -> Result<Recipe> {
        self.write_conn()
            .transaction::<_, Recipe, DbErr>(move |txn| {
                Box::pin(async move {
                    let recipe = RecipeActiveModel {
                        author_id: Set(author_id),
                        name: Set(name),
                        text: Set(text),
                        image: Set(image),
                        cooking_time: Set(cooking_time),
                        created_at: Set(chrono::Utc::now().into()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    insert_entries(txn, recipe.id, &entries).await?;

                    Ok(recipe)
                })
            })
            .await
            .map_err(txn_err)
    }

    /// Update a recipe's own fields and replace its ingredient set wholesale.
    /// Delete and reinsert of the join rows happen in one transaction, so a
    /// failed update leaves the previous set intact.
    pub async fn update_recipe(
        &self,
        recipe: Recipe,
        name: String,
        text: String,
        image: String,
        cooking_time: i32,
        entries: Vec<(i64, i32)>,
    ) -> Result<Recipe> {
        self.write_conn()
            .transaction::<_, Recipe, DbErr>(move |txn| {
                Box::pin(async move {
                    let recipe_id = recipe.id;

                    let mut active: RecipeActiveModel = recipe.into();
                    active.name = Set(name);
                    active.text = Set(text);
                    active.image = Set(image);
                    active.cooking_time = Set(cooking_time);
                    let updated = active.update(txn).await?;

                    IngredientInRecipeEntity::delete_many()
                        .filter(IngredientInRecipeColumn::RecipeId.eq(recipe_id))
                        .exec(txn)
                        .await?;

                    insert_entries(txn, recipe_id, &entries).await?;

                    Ok(updated)
                })
            })
            .await
            .map_err(txn_err)
    }

    /// Delete a recipe (join rows and relations cascade)
    pub async fn delete_recipe(&self, id: i64) -> Result<()> {
        RecipeEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;
        Ok(())
    }

    /// Find recipe by ID
    pub async fn find_recipe_by_id(&self, id: i64) -> Result<Option<Recipe>> {
        RecipeEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Whether a recipe exists, without fetching it
    pub async fn recipe_exists(&self, id: i64) -> Result<bool> {
        let count = RecipeEntity::find_by_id(id)
            .count(self.read_conn())
            .await?;
        Ok(count > 0)
    }

    /// List recipes in descending-id order with filters, paginated
    pub async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<Recipe>, u64)> {
        let mut query = RecipeEntity::find().order_by_desc(RecipeColumn::Id);

        if let Some(author_id) = filter.author {
            query = query.filter(RecipeColumn::AuthorId.eq(author_id));
        }

        if let Some(user_id) = filter.favorited_by {
            let ids = self.relation_recipe_ids(user_id, RelationKind::Favorite).await?;
            query = query.filter(RecipeColumn::Id.is_in(ids));
        }

        if let Some(user_id) = filter.in_cart_of {
            let ids = self
                .relation_recipe_ids(user_id, RelationKind::ShoppingCart)
                .await?;
            query = query.filter(RecipeColumn::Id.is_in(ids));
        }

        let paginator = query.paginate(self.read_conn(), limit);
        let count = paginator.num_items().await?;
        let recipes = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((recipes, count))
    }

    /// Recipes by one author, newest first, optionally capped
    pub async fn recipes_by_author(
        &self,
        author_id: i64,
        limit: Option<u64>,
    ) -> Result<Vec<Recipe>> {
        let mut query = RecipeEntity::find()
            .filter(RecipeColumn::AuthorId.eq(author_id))
            .order_by_desc(RecipeColumn::Id);

        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        query.all(self.read_conn()).await.map_err(Into::into)
    }

    /// Number of recipes by one author
    pub async fn count_recipes_by_author(&self, author_id: i64) -> Result<u64> {
        RecipeEntity::find()
            .filter(RecipeColumn::AuthorId.eq(author_id))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Ingredient entries of the given recipes joined with catalog rows
    pub async fn ingredient_rows_for_recipes(&self, recipe_ids: &[i64]) -> Result<Vec<IngredientRow>> {
        let rows = IngredientInRecipeEntity::find()
            .filter(IngredientInRecipeColumn::RecipeId.is_in(recipe_ids.iter().copied()))
            .order_by_asc(IngredientInRecipeColumn::Id)
            .find_also_related(IngredientEntity)
            .all(self.read_conn())
            .await?;

        // The foreign key guarantees the catalog row exists
        Ok(rows
            .into_iter()
            .filter_map(|(entry, ingredient)| {
                ingredient.map(|ingredient| IngredientRow { entry, ingredient })
            })
            .collect())
    }

    // ========================================================================
    // Relation Operations (Favorite / ShoppingCart)
    // ========================================================================

    /// Insert a user-recipe relation row; an existing pair maps to Conflict
    pub async fn add_relation(&self, user_id: i64, recipe_id: i64, kind: RelationKind) -> Result<()> {
        RecipeRelationActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            kind: Set(kind),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(self.write_conn())
        .await
        .map_err(|e| {
            on_unique_violation(
                e,
                AppError::Duplicate {
                    message: format!("recipe {} is already in {}", recipe_id, kind.label()),
                },
            )
        })?;

        Ok(())
    }

    /// Delete a user-recipe relation row; a missing pair maps to NotFound
    pub async fn remove_relation(
        &self,
        user_id: i64,
        recipe_id: i64,
        kind: RelationKind,
    ) -> Result<()> {
        let result = RecipeRelationEntity::delete_many()
            .filter(RecipeRelationColumn::UserId.eq(user_id))
            .filter(RecipeRelationColumn::RecipeId.eq(recipe_id))
            .filter(RecipeRelationColumn::Kind.eq(kind))
            .exec(self.write_conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::RelationNotFound {
                message: format!("recipe {} is not in {}", recipe_id, kind.label()),
            });
        }

        Ok(())
    }

    /// Whether the (user, recipe, kind) relation exists
    pub async fn relation_exists(
        &self,
        user_id: i64,
        recipe_id: i64,
        kind: RelationKind,
    ) -> Result<bool> {
        let count = RecipeRelationEntity::find()
            .filter(RecipeRelationColumn::UserId.eq(user_id))
            .filter(RecipeRelationColumn::RecipeId.eq(recipe_id))
            .filter(RecipeRelationColumn::Kind.eq(kind))
            .count(self.read_conn())
            .await?;
        Ok(count > 0)
    }

    /// All recipe ids a user has related with the given kind
    pub async fn relation_recipe_ids(&self, user_id: i64, kind: RelationKind) -> Result<Vec<i64>> {
        let rows = RecipeRelationEntity::find()
            .filter(RecipeRelationColumn::UserId.eq(user_id))
            .filter(RecipeRelationColumn::Kind.eq(kind))
            .all(self.read_conn())
            .await?;
        Ok(rows.into_iter().map(|r| r.recipe_id).collect())
    }

    /// Subset of `recipe_ids` the user has related with the given kind.
    /// One query per page instead of one per recipe.
    pub async fn related_subset(
        &self,
        user_id: i64,
        kind: RelationKind,
        recipe_ids: &[i64],
    ) -> Result<HashSet<i64>> {
        let rows = RecipeRelationEntity::find()
            .filter(RecipeRelationColumn::UserId.eq(user_id))
            .filter(RecipeRelationColumn::Kind.eq(kind))
            .filter(RecipeRelationColumn::RecipeId.is_in(recipe_ids.iter().copied()))
            .all(self.read_conn())
            .await?;
        Ok(rows.into_iter().map(|r| r.recipe_id).collect())
    }

    /// Recipes currently in the user's shopping cart, ascending id
    pub async fn cart_recipes(&self, user_id: i64) -> Result<Vec<Recipe>> {
        let ids = self
            .relation_recipe_ids(user_id, RelationKind::ShoppingCart)
            .await?;

        RecipeEntity::find()
            .filter(RecipeColumn::Id.is_in(ids))
            .order_by_asc(RecipeColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Subscription Operations
    // ========================================================================

    /// Insert a follower-author row; an existing pair maps to Conflict
    pub async fn add_subscription(&self, follower_id: i64, author_id: i64) -> Result<()> {
        SubscriptionActiveModel {
            follower_id: Set(follower_id),
            author_id: Set(author_id),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(self.write_conn())
        .await
        .map_err(|e| {
            on_unique_violation(
                e,
                AppError::Duplicate {
                    message: format!("already subscribed to user {}", author_id),
                },
            )
        })?;

        Ok(())
    }

    /// Delete a follower-author row; a missing pair maps to NotFound
    pub async fn remove_subscription(&self, follower_id: i64, author_id: i64) -> Result<()> {
        let result = SubscriptionEntity::delete_many()
            .filter(SubscriptionColumn::FollowerId.eq(follower_id))
            .filter(SubscriptionColumn::AuthorId.eq(author_id))
            .exec(self.write_conn())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::RelationNotFound {
                message: format!("not subscribed to user {}", author_id),
            });
        }

        Ok(())
    }

    /// Whether follower follows author
    pub async fn is_subscribed(&self, follower_id: i64, author_id: i64) -> Result<bool> {
        let count = SubscriptionEntity::find()
            .filter(SubscriptionColumn::FollowerId.eq(follower_id))
            .filter(SubscriptionColumn::AuthorId.eq(author_id))
            .count(self.read_conn())
            .await?;
        Ok(count > 0)
    }

    /// Authors the user follows, ordered by username, paginated
    pub async fn list_subscribed_authors(
        &self,
        follower_id: i64,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<User>, u64)> {
        let author_ids: Vec<i64> = SubscriptionEntity::find()
            .filter(SubscriptionColumn::FollowerId.eq(follower_id))
            .all(self.read_conn())
            .await?
            .into_iter()
            .map(|s| s.author_id)
            .collect();

        let paginator = UserEntity::find()
            .filter(UserColumn::Id.is_in(author_ids))
            .order_by_asc(UserColumn::Username)
            .paginate(self.read_conn(), limit);

        let count = paginator.num_items().await?;
        let authors = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((authors, count))
    }
}

/// Bulk-insert ingredient entries for a recipe
async fn insert_entries(
    txn: &sea_orm::DatabaseTransaction,
    recipe_id: i64,
    entries: &[(i64, i32)],
) -> std::result::Result<(), DbErr> {
    let models: Vec<IngredientInRecipeActiveModel> = entries
        .iter()
        .map(|&(ingredient_id, amount)| IngredientInRecipeActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(ingredient_id),
            amount: Set(amount),
            ..Default::default()
        })
        .collect();

    if !models.is_empty() {
        IngredientInRecipeEntity::insert_many(models).exec(txn).await?;
    }

    Ok(())
}
