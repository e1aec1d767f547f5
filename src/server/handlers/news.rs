use std::sync::Arc;

use actix_web::web::Data;
use log::error;
use serde::Serialize;

use crate::news::NewsError;
use crate::server::context::ServerContext;
use crate::server::response::Response;

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub news: serde_json::Value,
}

pub async fn get_news(sc: Data<Arc<ServerContext>>) -> Response<NewsResponse> {
    match sc.news.fetch().await {
        Ok(news) => Response::ok(NewsResponse { news }),
        Err(NewsError::Failed { code, stderr }) => {
            error!("News program exited with code {code}: {}", stderr.trim());
            Response::internal_server_error(format!("Error fetching news: {stderr}"))
        }
        Err(NewsError::Parse(e)) => {
            error!("Failed to parse news program output: {e}");
            Response::internal_server_error("Error parsing news data")
        }
        Err(e) => {
            error!("Failed to fetch news: {e}");
            Response::error(e.to_string())
        }
    }
}
