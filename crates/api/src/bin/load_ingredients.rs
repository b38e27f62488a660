//! Ingredient catalog seeder
//!
//! Loads the catalog from a JSON file of `{name, measurement_unit}` objects.
//! Existing entries are left alone, so reruns are safe.
//!
//! Usage: `load-ingredients [path/to/ingredients.json]`

use foodgram_common::{config::AppConfig, db::DbPool, db::Repository};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct SeedIngredient {
    name: String,
    measurement_unit: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/ingredients.json".to_string());

    let config = AppConfig::load()?;
    let db = DbPool::new(&config.database).await?;
    let repo = Repository::new(db);

    let raw = tokio::fs::read_to_string(&path).await?;
    let seed: Vec<SeedIngredient> = serde_json::from_str(&raw)?;

    info!("Loading {} catalog entries from {}", seed.len(), path);

    let mut created = 0usize;
    for item in &seed {
        let (_, was_created) = repo
            .get_or_create_ingredient(&item.name, &item.measurement_unit)
            .await?;
        if was_created {
            created += 1;
        }
    }

    info!("{} ingredients loaded", created);
    Ok(())
}
