pub mod rest;

use std::sync::Arc;

use crate::config::Config;
use crate::db::DbPool;
use crate::storage::FileStore;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub files: Arc<FileStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(db: DbPool, files: FileStore, config: Config) -> Self {
        Self {
            db,
            files: Arc::new(files),
            config,
        }
    }
}
