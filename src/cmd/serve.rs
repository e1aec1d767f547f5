use anyhow::{Context, Result};
use clap::Args;
use log::info;

use crate::config::ConfigArgs;
use crate::server::config::ServerConfig;

/// Run the HTTP server.
#[derive(Args)]
pub struct ServeArgs {
    /// Print server configuration data (JSON) and exit.
    #[arg(long)]
    pub print_config: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl ServeArgs {
    pub async fn run(&self) -> Result<()> {
        let cfg: ServerConfig = self.config.load("server")?;

        if self.print_config {
            let json = serde_json::to_string_pretty(&cfg).context("encode config")?;
            println!("{json}");
            return Ok(());
        }

        cfg.logs.init()?;

        let ctx = cfg.build_ctx()?;
        let restful_server = cfg.build_restful_server(ctx)?;
        restful_server.run().await.context("run restful server")?;

        info!("Server exited by user");
        Ok(())
    }
}
