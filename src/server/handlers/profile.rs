use std::sync::Arc;

use actix_web::web::{self, Bytes, Data};
use actix_web::HttpRequest;
use log::{debug, error, info, warn};

use crate::auth::password::{generate_salt, hash_password, verify_password};
use crate::avatar::AvatarError;
use crate::server::context::ServerContext;
use crate::server::request::read_upload;
use crate::server::response::{self, Response};
use crate::time::now_secs;
use crate::types::user::{
    AvatarResponse, ChangePasswordRequest, ProfilePatch, ProfileResponse, DEFAULT_AVATAR,
};

pub async fn get_profile(req: HttpRequest, sc: Data<Arc<ServerContext>>) -> Response<ProfileResponse> {
    let op = crate::auth_request!(sc, req);
    Response::ok(ProfileResponse { user: op })
}

pub async fn put_profile(
    req: HttpRequest,
    body: Option<Bytes>,
    sc: Data<Arc<ServerContext>>,
) -> Response<ProfileResponse> {
    let op = crate::auth_request!(sc, req);
    let patch: ProfilePatch = crate::parse_json!(req, body);

    debug!("Update profile of user {}: {patch:?}", op.id);
    let result = sc.db.with_transaction(|tx| {
        if !patch.is_empty() && !tx.update_profile(op.id, &patch, now_secs())? {
            return Ok(None);
        }
        tx.get_identity(op.id)
    });

    match result {
        Ok(Some(user)) => Response::ok(ProfileResponse { user }),
        Ok(None) => Response::not_found("User not found"),
        Err(e) => {
            error!("Failed to update profile of user {}: {e:#}", op.id);
            Response::error(response::DATABASE_ERROR)
        }
    }
}

pub async fn post_avatar(
    req: HttpRequest,
    body: Option<Bytes>,
    sc: Data<Arc<ServerContext>>,
) -> Response<AvatarResponse> {
    let op = crate::auth_request!(sc, req);

    let body = match body {
        Some(body) => body,
        None => {
            let limit = AvatarError::TooLarge(sc.avatars.limit_mib());
            return Response::bad_request(limit);
        }
    };
    let upload = match read_upload(&req, body, "avatar").await {
        Ok(Some(upload)) => upload,
        Ok(None) => return Response::bad_request(AvatarError::Empty),
        Err(e) => return Response::bad_request(format!("Invalid request: {e:#}")),
    };

    let ctx = sc.get_ref().clone();
    let saved =
        web::block(move || ctx.avatars.save(upload.content_type.as_deref(), &upload.data)).await;
    let name = match saved {
        Ok(Ok(name)) => name,
        Ok(Err(AvatarError::Io(e))) => {
            error!("Failed to save avatar of user {}: {e:#}", op.id);
            return Response::error("save avatar failed");
        }
        Ok(Err(e)) => return Response::bad_request(e),
        Err(e) => {
            error!("Avatar save task of user {} failed: {e}", op.id);
            return Response::error("save avatar failed");
        }
    };

    let result = sc
        .db
        .with_transaction(|tx| tx.update_avatar(op.id, &name, now_secs()));
    let old = match result {
        Ok(old) => old,
        Err(e) => {
            error!("Failed to update avatar of user {}: {e:#}", op.id);
            if let Err(e) = sc.avatars.remove(&name) {
                warn!("Failed to clean up avatar '{name}': {e:#}");
            }
            return Response::error(response::DATABASE_ERROR);
        }
    };

    if let Some(old) = old {
        if old != DEFAULT_AVATAR {
            if let Err(e) = sc.avatars.remove(&old) {
                warn!("Failed to delete old avatar of user {}: {e:#}", op.id);
            }
        }
    }

    Response::ok(AvatarResponse { avatar: name })
}

pub async fn put_password(
    req: HttpRequest,
    body: Option<Bytes>,
    sc: Data<Arc<ServerContext>>,
) -> Response<()> {
    let op = crate::auth_request!(sc, req);
    let change: ChangePasswordRequest = crate::parse_json!(req, body);

    let record = match sc.db.with_transaction(|tx| tx.get_password_by_id(op.id)) {
        Ok(Some(record)) => record,
        Ok(None) => return Response::not_found("User not found"),
        Err(e) => {
            error!("Failed to get password of user {}: {e:#}", op.id);
            return Response::error(response::DATABASE_ERROR);
        }
    };

    let current = change.current_password;
    let verified =
        web::block(move || verify_password(&current, &record.salt, &record.password)).await;
    match verified {
        Ok(true) => {}
        Ok(false) => {
            warn!("Password change rejected for user {}: wrong current password", op.id);
            return Response::unauthorized("Current password is incorrect");
        }
        Err(e) => {
            error!("Password check task of user {} failed: {e}", op.id);
            return Response::error("verify password failed");
        }
    }
    if change.new_password.is_empty() {
        return Response::bad_request("New password is required");
    }

    let new_password = change.new_password;
    let hashed = web::block(move || {
        let salt = generate_salt();
        let hash = hash_password(&new_password, &salt);
        (hash, salt)
    })
    .await;
    let (hash, salt) = match hashed {
        Ok(hashed) => hashed,
        Err(e) => {
            error!("Password hash task of user {} failed: {e}", op.id);
            return Response::error("hash password failed");
        }
    };
    let result = sc
        .db
        .with_transaction(|tx| tx.update_password(op.id, &hash, &salt, now_secs()));
    if let Err(e) = result {
        error!("Failed to update password of user {}: {e:#}", op.id);
        return Response::error(response::DATABASE_ERROR);
    }

    info!("Password of user {} updated", op.id);
    Response::message("Password updated successfully")
}
