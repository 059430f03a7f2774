use std::sync::Arc;

use super::{
    config::Config,
    database::init_mongo,
    error::StartupError,
    pattern::PatternBuilder,
    search::{Catalog, Searcher, mongo::MongoCatalog},
};

pub struct State {
    pub config: Config,
    pub searcher: Searcher,
}

impl State {
    pub async fn new() -> Result<Arc<Self>, StartupError> {
        let config = Config::load()?;

        let database = init_mongo(&config).await?;
        let catalog = Arc::new(MongoCatalog::new(database, &config.collation_locale));

        Ok(Self::with_catalog(config, catalog))
    }

    pub fn with_catalog(config: Config, catalog: Arc<dyn Catalog>) -> Arc<Self> {
        let searcher = Searcher::new(catalog, PatternBuilder::new(config.smart_prefix_min_chars));

        Arc::new(Self { config, searcher })
    }
}
