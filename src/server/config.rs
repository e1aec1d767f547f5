use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslFiletype, SslMethod};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{JwtTokenGenerator, JwtTokenValidator};
use crate::auth::AuthGate;
use crate::avatar::AvatarStore;
use crate::config::{expandenv, CommonConfig, PathSet};
use crate::db::config::DbConfig;
use crate::dirs::ensure_dir_exists;
use crate::logs::LogsConfig;
use crate::news::NewsConfig;

use super::context::ServerContext;
use super::restful::RestfulServer;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_bind")]
    pub bind: String,

    #[serde(default)]
    pub ssl: bool,

    /// HMAC secret used to sign tokens, supports `${ENV}` expansion. Never
    /// printed.
    #[serde(default, skip_serializing)]
    pub jwt_secret: String,

    #[serde(default = "ServerConfig::default_token_expiration_secs")]
    pub token_expiration_secs: u64,

    pub keep_alive_secs: Option<u64>,

    pub workers: Option<u64>,

    #[serde(default = "ServerConfig::default_payload_limit_mib")]
    pub payload_limit_mib: usize,

    #[serde(default = "ServerConfig::default_avatar_limit_mib")]
    pub avatar_limit_mib: usize,

    /// Root of uploaded files, avatars live in its `avatars` sub directory.
    /// Default is `{data_path}/uploads`.
    #[serde(default)]
    pub uploads_dir: String,

    #[serde(default)]
    pub db: DbConfig,

    #[serde(default)]
    pub news: NewsConfig,

    #[serde(default)]
    pub logs: LogsConfig,

    #[serde(skip)]
    pki_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: Self::default_bind(),
            ssl: false,
            jwt_secret: String::new(),
            token_expiration_secs: Self::default_token_expiration_secs(),
            keep_alive_secs: None,
            workers: None,
            payload_limit_mib: Self::default_payload_limit_mib(),
            avatar_limit_mib: Self::default_avatar_limit_mib(),
            uploads_dir: String::new(),
            db: DbConfig::default(),
            news: NewsConfig::default(),
            logs: LogsConfig::default(),
            pki_dir: PathBuf::new(),
        }
    }
}

impl CommonConfig for ServerConfig {
    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        if self.bind.is_empty() {
            bail!("bind is required");
        }

        self.jwt_secret = expandenv("jwt_secret", &self.jwt_secret)?;
        if self.jwt_secret.is_empty() {
            bail!("jwt_secret is required");
        }

        if self.token_expiration_secs < Self::MIN_TOKEN_EXPIRATION_SECS
            || self.token_expiration_secs > Self::MAX_TOKEN_EXPIRATION_SECS
        {
            bail!(
                "token_expiration_secs must be in range [{}, {}]",
                Self::MIN_TOKEN_EXPIRATION_SECS,
                Self::MAX_TOKEN_EXPIRATION_SECS
            );
        }

        if let Some(keep_alive_secs) = self.keep_alive_secs {
            if keep_alive_secs == 0 {
                bail!("keep_alive_secs must be greater than 0");
            }
        }

        if let Some(workers) = self.workers {
            if workers == 0 {
                bail!("workers must be greater than 0");
            }
        }

        if self.avatar_limit_mib == 0 {
            bail!("avatar_limit_mib must be greater than 0");
        }
        if self.payload_limit_mib < self.avatar_limit_mib {
            bail!(
                "payload_limit_mib ({}) must not be less than avatar_limit_mib ({})",
                self.payload_limit_mib,
                self.avatar_limit_mib
            );
        }

        self.uploads_dir = expandenv("uploads_dir", &self.uploads_dir)?;
        if self.uploads_dir.is_empty() {
            let dir = ps.data_dir.join("uploads");
            self.uploads_dir = format!("{}", dir.display());
        }

        self.db.complete(ps).context("db")?;
        self.news.complete(ps).context("news")?;

        self.pki_dir = ps.pki_dir.clone();

        Ok(())
    }
}

impl ServerConfig {
    const MIN_TOKEN_EXPIRATION_SECS: u64 = 60;
    const MAX_TOKEN_EXPIRATION_SECS: u64 = 60 * 60 * 24 * 365;

    pub fn avatar_dir(&self) -> PathBuf {
        PathBuf::from(&self.uploads_dir).join("avatars")
    }

    pub fn build_ctx(&self) -> Result<Arc<ServerContext>> {
        let db = Arc::new(self.db.build().context("init database")?);

        let secret = self.jwt_secret.as_bytes();
        let jwt_generator = JwtTokenGenerator::new(secret, self.token_expiration_secs);
        let auth = AuthGate::new(JwtTokenValidator::new(secret), db.clone());

        let avatar_dir = self.avatar_dir();
        ensure_dir_exists(&avatar_dir).context("ensure avatar dir")?;
        info!("Storing avatars in {}", avatar_dir.display());
        let avatars = AvatarStore::new(avatar_dir, self.avatar_limit_mib);

        let ctx = ServerContext {
            db,
            auth,
            jwt_generator,
            avatars,
            news: self.news.build(),
        };
        Ok(Arc::new(ctx))
    }

    pub fn build_restful_server(&self, ctx: Arc<ServerContext>) -> Result<RestfulServer> {
        let mut srv = RestfulServer::new(self.bind.clone(), ctx, self.payload_limit_mib);
        if self.ssl {
            let ssl = self.build_ssl()?;
            srv.set_ssl(ssl);
        }

        if let Some(keep_alive_secs) = self.keep_alive_secs {
            srv.set_keep_alive_secs(keep_alive_secs);
        }

        if let Some(workers) = self.workers {
            srv.set_workers(workers);
        }

        Ok(srv)
    }

    fn build_ssl(&self) -> Result<SslAcceptorBuilder> {
        let key_path = self.pki_dir.join("key.pem");
        if !key_path.exists() {
            bail!("ssl key file not exists: {:?}", key_path);
        }

        let cert_path = self.pki_dir.join("cert.pem");
        if !cert_path.exists() {
            bail!("ssl cert file not exists: {:?}", cert_path);
        }

        let mut builder =
            SslAcceptor::mozilla_intermediate(SslMethod::tls()).context("init ssl acceptor")?;

        builder
            .set_private_key_file(&key_path, SslFiletype::PEM)
            .context("load ssl key file")?;
        builder
            .set_certificate_chain_file(&cert_path)
            .context("load ssl cert file")?;

        Ok(builder)
    }

    fn default_bind() -> String {
        String::from("127.0.0.1:5000")
    }

    fn default_token_expiration_secs() -> u64 {
        60 * 60 * 24 * 30 // 30 days
    }

    fn default_payload_limit_mib() -> usize {
        6
    }

    fn default_avatar_limit_mib() -> usize {
        5
    }
}
