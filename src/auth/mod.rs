pub mod jwt;
pub mod password;

use std::sync::Arc;

use actix_web::http::header;
use actix_web::HttpRequest;
use anyhow::Result;
use thiserror::Error;

use crate::db::Database;
use crate::time::now_secs;
use crate::types::user::Identity;

use jwt::JwtTokenValidator;

/// Authenticates the request, evaluating to the caller's [`Identity`].
/// Returns 401 from the enclosing handler when the credential is rejected,
/// and 500 when the user lookup itself fails.
#[macro_export]
macro_rules! auth_request {
    ($sc:expr, $req:expr) => {
        match $sc.auth.resolve_request(&$req) {
            Ok($crate::auth::AuthResult::Ok(identity)) => identity,
            Ok($crate::auth::AuthResult::Failed(failure)) => {
                log::warn!(
                    "Rejected {} {}: {failure}",
                    $req.method(),
                    $req.path()
                );
                return $crate::server::response::Response::unauthorized(failure.message());
            }
            Err(e) => {
                log::error!("Failed to authenticate request: {e:#}");
                return $crate::server::response::Response::error("authentication failed");
            }
        }
    };
}

/// Why a credential was rejected. Only logged, clients see [`AuthFailure::message`].
#[derive(Debug, Error, PartialEq)]
pub enum AuthFailure {
    #[error("missing authorization header")]
    MissingCredential,

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("user {0} not found")]
    UnknownSubject(u64),
}

impl AuthFailure {
    pub fn message(&self) -> &'static str {
        match self {
            AuthFailure::MissingCredential => "Not authorized, no token",
            _ => "Not authorized",
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum AuthResult {
    Ok(Identity),
    Failed(AuthFailure),
}

impl AuthResult {
    fn invalid(msg: impl ToString) -> Self {
        Self::Failed(AuthFailure::InvalidCredential(msg.to_string()))
    }
}

/// Resolves a user id to its identity for the gate.
pub trait UserLookup: Send + Sync {
    fn find_identity(&self, id: u64) -> Result<Option<Identity>>;
}

impl UserLookup for Database {
    fn find_identity(&self, id: u64) -> Result<Option<Identity>> {
        self.with_transaction(|tx| tx.get_identity(id))
    }
}

/// Verifies bearer tokens on protected routes and resolves them to the
/// calling user.
pub struct AuthGate<L: UserLookup = Database> {
    validator: JwtTokenValidator,
    users: Arc<L>,
}

impl<L: UserLookup> AuthGate<L> {
    pub fn new(validator: JwtTokenValidator, users: Arc<L>) -> Self {
        Self { validator, users }
    }

    pub fn resolve_request(&self, req: &HttpRequest) -> Result<AuthResult> {
        let value = match req.headers().get(header::AUTHORIZATION) {
            Some(value) => match value.to_str() {
                Ok(s) => Some(s),
                Err(_) => return Ok(AuthResult::invalid("authorization header is not ascii")),
            },
            None => None,
        };
        self.resolve(value, now_secs())
    }

    /// The `Err` case is reserved for lookup failures, every problem with the
    /// credential itself is reported as [`AuthResult::Failed`].
    pub fn resolve(&self, authorization: Option<&str>, now: u64) -> Result<AuthResult> {
        let authorization = match authorization {
            Some(s) => s,
            None => return Ok(AuthResult::Failed(AuthFailure::MissingCredential)),
        };

        let fields = authorization.split_whitespace().collect::<Vec<&str>>();
        if fields.len() != 2 {
            return Ok(AuthResult::invalid("expect 'Bearer <token>'"));
        }
        if !fields[0].eq_ignore_ascii_case("bearer") {
            return Ok(AuthResult::invalid(format!(
                "unsupported authorization type '{}'",
                fields[0]
            )));
        }

        let id = match self.validator.validate_token(fields[1], now) {
            Ok(id) => id,
            Err(e) => return Ok(AuthResult::invalid(format!("{e:#}"))),
        };

        match self.users.find_identity(id)? {
            Some(identity) => Ok(AuthResult::Ok(identity)),
            None => Ok(AuthResult::Failed(AuthFailure::UnknownSubject(id))),
        }
    }
}
