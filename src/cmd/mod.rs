mod questions;
mod serve;
mod user;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use crate::config::{CommonConfig, PathSet};
use crate::db::config::DbConfig;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about)]
pub struct App {
    #[command(subcommand)]
    pub commands: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Serve(serve::ServeArgs),
    CreateUser(user::CreateUserArgs),
    ImportQuestions(questions::ImportQuestionsArgs),
}

impl App {
    pub async fn run(&self) -> Result<()> {
        match &self.commands {
            Commands::Serve(args) => args.run().await,
            Commands::CreateUser(args) => args.run(),
            Commands::ImportQuestions(args) => args.run(),
        }
    }
}

/// The `[db]` table of `server.toml`. Admin commands only touch the
/// database, so the rest of the server config (the token secret included)
/// is neither required nor validated.
#[derive(Debug, Default, Deserialize)]
struct DbOnlyConfig {
    #[serde(default)]
    db: DbConfig,
}

impl CommonConfig for DbOnlyConfig {
    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        self.db.complete(ps).context("db")
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;

    use super::*;

    #[test]
    fn test_db_only_config() {
        let root = env::temp_dir().join("test_mindcare_cmd_db_only");
        let _ = fs::remove_dir_all(&root);
        let ps = PathSet::new(Some(root.join("config")), Some(root.join("data"))).unwrap();

        // no jwt_secret, which `serve` would reject
        fs::write(
            ps.config_dir.join("server.toml"),
            "bind = \"0.0.0.0:5000\"\n\n[db]\nmemory = true\n",
        )
        .unwrap();
        let cfg: DbOnlyConfig = ps.load_config("server").unwrap();
        assert!(cfg.db.memory);
        cfg.db.build().unwrap();

        fs::remove_file(ps.config_dir.join("server.toml")).unwrap();
        let cfg: DbOnlyConfig = ps.load_config("server").unwrap();
        assert!(!cfg.db.memory);
        assert_eq!(
            cfg.db.path,
            format!("{}", ps.data_dir.join("mindcare.db").display())
        );
    }
}
