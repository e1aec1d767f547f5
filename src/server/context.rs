use std::sync::Arc;

use crate::auth::jwt::JwtTokenGenerator;
use crate::auth::AuthGate;
use crate::avatar::AvatarStore;
use crate::db::Database;
use crate::news::NewsFetcher;

/// Everything the handlers share, built once from [`super::config::ServerConfig`].
pub struct ServerContext {
    pub db: Arc<Database>,

    pub auth: AuthGate,
    pub jwt_generator: JwtTokenGenerator,

    pub avatars: AvatarStore,
    pub news: NewsFetcher,
}

#[cfg(test)]
impl ServerContext {
    pub fn new_test() -> Self {
        Self::new_test_with_news(crate::news::NewsConfig {
            program: String::from("sh"),
            args: vec![String::from("-c"), String::from("echo '[]'")],
            timeout_secs: 5,
        })
    }

    pub fn new_test_with_news(news: crate::news::NewsConfig) -> Self {
        use std::sync::atomic::{AtomicUsize, Ordering};

        use crate::auth::jwt::JwtTokenValidator;

        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let dir = std::env::temp_dir().join(format!(
            "test_mindcare_ctx_{}_{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let db = Arc::new(Database::new_test());
        Self {
            auth: AuthGate::new(JwtTokenValidator::new_test(), db.clone()),
            db,
            jwt_generator: JwtTokenGenerator::new_test(),
            avatars: AvatarStore::new(dir, 1),
            news: news.build(),
        }
    }
}
