mod context;
mod handlers;
mod restful;

pub mod config;
pub mod request;
pub mod response;
