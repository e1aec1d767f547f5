use anyhow::Result;
use log::info;

use crate::auth::password::{generate_salt, hash_password};
use crate::db::{CreateUserParams, Database};
use crate::types::user::{RegisterRequest, DEFAULT_AVATAR};

/// Creates an account from a validated request. Returns `None` when the
/// username or email is already taken.
pub fn create_account(db: &Database, req: &RegisterRequest, now: u64) -> Result<Option<u64>> {
    let salt = generate_salt();
    let password = hash_password(&req.password, &salt);

    let id = db.with_transaction(|tx| {
        if tx.has_user_conflict(&req.username, &req.email)? {
            return Ok(None);
        }
        let id = tx.create_user(CreateUserParams {
            username: req.username.clone(),
            email: req.email.clone(),
            password,
            salt,
            avatar: String::from(DEFAULT_AVATAR),
            create_time: now,
        })?;
        Ok(Some(id))
    })?;

    if let Some(id) = id {
        info!("Created account {id} for '{}'", req.username);
    }
    Ok(id)
}
