use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::fairness::AssignmentStrategy;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub assignment: Box<dyn AssignmentStrategy>,
}

impl AppState {
    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("database lock poisoned")))
    }
}
