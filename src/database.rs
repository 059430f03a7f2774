//! # MongoDB
//!
//! Document store shared with the marketplace CRUD services.
//!
//! ## Requirements
//!
//! - Read-only access to `vendors`, `ventures` and `products`
//! - Aggregation pipelines with `$lookup` for owner joins
//! - Collation support for locale-aware, accent-insensitive comparisons
//!
//! ## Implementation
//!
//! - One pooled client per process, cloned into every request
//! - Short connect timeout so a missing database fails startup instead of the first search
//! - Ping on startup
use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tracing::info;

use crate::config::Config;

const APP_NAME: &str = "marketplace-search";

pub async fn init_mongo(config: &Config) -> Result<Database, mongodb::error::Error> {
    let mut options = ClientOptions::parse(&config.mongo_uri).await?;
    options.app_name = Some(APP_NAME.to_string());
    options.connect_timeout = Some(config.mongo_connect_timeout);
    options.server_selection_timeout = Some(config.mongo_connect_timeout);

    let client = Client::with_options(options)?;
    let database = client.database(&config.mongo_database);

    database.run_command(doc! { "ping": 1 }).await?;
    info!("Connected to MongoDB database {}", config.mongo_database);

    Ok(database)
}
