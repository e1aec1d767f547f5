use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::{expandenv, CommonConfig, PathSet};

use super::sqlite::Sqlite;
use super::Database;

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct DbConfig {
    /// Keep the whole database in memory, the data will be lost on exit.
    #[serde(default)]
    pub memory: bool,

    /// SQLite file, default is `{data_path}/mindcare.db`.
    #[serde(default)]
    pub path: String,
}

impl CommonConfig for DbConfig {
    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        if self.memory {
            return Ok(());
        }

        self.path = expandenv("path", &self.path)?;
        if self.path.is_empty() {
            let path = ps.data_dir.join("mindcare.db");
            self.path = format!("{}", path.display());
        }

        Ok(())
    }
}

impl DbConfig {
    pub fn build(&self) -> Result<Database> {
        let sqlite = if self.memory {
            warn!("Using in-memory sqlite database, the data will be lost when the server stops");
            Sqlite::memory().context("open in-memory sqlite")?
        } else {
            info!("Using sqlite database: {}", self.path);
            let path = PathBuf::from(&self.path);
            Sqlite::open(&path).with_context(|| format!("open sqlite file '{}'", self.path))?
        };
        Ok(Database::new(sqlite))
    }
}
