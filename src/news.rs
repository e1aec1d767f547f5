use std::process::Stdio;
use std::time::Duration;

use anyhow::{bail, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::{expandenv, CommonConfig, PathSet};

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("launch news program: {0}")]
    Spawn(std::io::Error),

    #[error("news program did not finish in {0} seconds")]
    Timeout(u64),

    #[error("news program exited with code {code}: {stderr}")]
    Failed { code: String, stderr: String },

    #[error("parse news program output: {0}")]
    Parse(serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewsConfig {
    #[serde(default = "NewsConfig::default_program")]
    pub program: String,

    #[serde(default = "NewsConfig::default_args")]
    pub args: Vec<String>,

    #[serde(default = "NewsConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            program: Self::default_program(),
            args: Self::default_args(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl CommonConfig for NewsConfig {
    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        self.program = expandenv("program", &self.program)?;
        if self.program.is_empty() {
            bail!("program is required");
        }
        for (idx, arg) in self.args.iter_mut().enumerate() {
            *arg = expandenv(&format!("args[{idx}]"), &*arg)?;
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than 0");
        }
        Ok(())
    }
}

impl NewsConfig {
    fn default_program() -> String {
        String::from("python3")
    }

    fn default_args() -> Vec<String> {
        vec![String::from("scripts/news_crawler.py")]
    }

    fn default_timeout_secs() -> u64 {
        60
    }

    pub fn build(&self) -> NewsFetcher {
        NewsFetcher {
            program: self.program.clone(),
            args: self.args.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Runs the external news scraper and returns whatever JSON it prints.
pub struct NewsFetcher {
    program: String,
    args: Vec<String>,
    timeout_secs: u64,
}

impl NewsFetcher {
    pub async fn fetch(&self) -> Result<serde_json::Value, NewsError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        debug!("Running news program: {} {:?}", self.program, self.args);
        let child = cmd.spawn().map_err(NewsError::Spawn)?;

        let wait = timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        );
        let output = match wait.await {
            Ok(result) => result.map_err(NewsError::Spawn)?,
            Err(_) => return Err(NewsError::Timeout(self.timeout_secs)),
        };

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|code| code.to_string())
                .unwrap_or("<unknown>".to_string());
            return Err(NewsError::Failed { code, stderr });
        }
        if !stderr.trim().is_empty() {
            warn!("News program stderr: {}", stderr.trim());
        }

        serde_json::from_slice(&output.stdout).map_err(NewsError::Parse)
    }
}
