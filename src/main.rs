mod account;
mod auth;
mod avatar;
mod cmd;
mod config;
mod db;
mod dirs;
mod logs;
mod mbti;
mod news;
mod server;
mod time;
mod types;

use std::process;

use clap::Parser;
use cmd::App;
use log::error;

#[tokio::main]
async fn main() {
    let app = App::parse();
    if let Err(e) = app.run().await {
        error!("Error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
