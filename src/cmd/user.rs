use anyhow::{bail, Result};
use clap::Args;

use crate::account::create_account;
use crate::config::ConfigArgs;
use crate::logs::{self, LogLevel};
use crate::time::now_secs;
use crate::types::user::RegisterRequest;

use super::DbOnlyConfig;

/// Create an account directly in the database.
#[derive(Args)]
pub struct CreateUserArgs {
    /// Login name, must be unique.
    #[arg(long)]
    pub username: String,

    /// Email address, must be unique.
    #[arg(long)]
    pub email: String,

    /// Initial password, the user can change it later from the profile page.
    #[arg(long)]
    pub password: String,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl CreateUserArgs {
    pub fn run(&self) -> Result<()> {
        let cfg: DbOnlyConfig = self.config.load("server")?;
        logs::init(LogLevel::Warn)?;

        let req = RegisterRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        };
        req.validate()?;

        let db = cfg.db.build()?;
        match create_account(&db, &req, now_secs())? {
            Some(id) => {
                println!("Created user '{}' with id {id}", req.username);
                Ok(())
            }
            None => bail!("username or email already exists"),
        }
    }
}
