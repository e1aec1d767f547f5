use std::sync::Arc;

use actix_web::web::{self, Bytes, Data};
use actix_web::HttpRequest;
use log::{error, info, warn};

use crate::account::create_account;
use crate::auth::password::verify_password;
use crate::server::context::ServerContext;
use crate::server::response::{self, Response};
use crate::time::now_secs;
use crate::types::user::{AuthResponse, AuthUser, LoginRequest, RegisterRequest, DEFAULT_AVATAR};

pub async fn register(
    req: HttpRequest,
    body: Option<Bytes>,
    sc: Data<Arc<ServerContext>>,
) -> Response<AuthResponse> {
    let reg: RegisterRequest = crate::parse_json!(req, body);
    if let Err(e) = reg.validate() {
        return Response::bad_request(format!("Invalid request: {e:#}"));
    }

    let now = now_secs();
    let db = sc.db.clone();
    let account = reg.clone();
    let id = match web::block(move || create_account(&db, &account, now)).await {
        Ok(Ok(Some(id))) => id,
        Ok(Ok(None)) => return Response::bad_request("Username or email already exists"),
        Ok(Err(e)) => {
            error!("Failed to register user '{}': {e:#}", reg.username);
            return Response::error(response::DATABASE_ERROR);
        }
        Err(e) => {
            error!("Register task of user '{}' failed: {e}", reg.username);
            return Response::error("create account failed");
        }
    };

    let token = match sc.jwt_generator.generate_token(id, now) {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to generate token for user {id}: {e:#}");
            return Response::error(response::TOKEN_ERROR);
        }
    };

    Response::created(AuthResponse {
        token,
        user: AuthUser {
            id,
            username: reg.username,
            email: Some(reg.email),
            avatar: Some(String::from(DEFAULT_AVATAR)),
        },
    })
}

pub async fn login(
    req: HttpRequest,
    body: Option<Bytes>,
    sc: Data<Arc<ServerContext>>,
) -> Response<AuthResponse> {
    let login: LoginRequest = crate::parse_json!(req, body);

    let result = sc
        .db
        .with_transaction(|tx| tx.get_password_by_name(&login.username));
    let record = match result {
        Ok(Some(record)) => record,
        Ok(None) => {
            warn!("Login failed: user '{}' not found", login.username);
            return Response::unauthorized("Invalid credentials");
        }
        Err(e) => {
            error!("Failed to get user '{}' for login: {e:#}", login.username);
            return Response::error(response::DATABASE_ERROR);
        }
    };

    let password = login.password;
    let (salt, hash) = (record.salt.clone(), record.password.clone());
    match web::block(move || verify_password(&password, &salt, &hash)).await {
        Ok(true) => {}
        Ok(false) => {
            warn!("Login failed: wrong password for user '{}'", login.username);
            return Response::unauthorized("Invalid credentials");
        }
        Err(e) => {
            error!("Password check task of user '{}' failed: {e}", login.username);
            return Response::error("verify password failed");
        }
    }

    let token = match sc.jwt_generator.generate_token(record.id, now_secs()) {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to generate token for user {}: {e:#}", record.id);
            return Response::error(response::TOKEN_ERROR);
        }
    };

    info!("User '{}' logged in", record.username);
    Response::ok(AuthResponse {
        token,
        user: AuthUser {
            id: record.id,
            username: record.username,
            email: None,
            avatar: None,
        },
    })
}
