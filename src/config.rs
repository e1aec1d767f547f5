use std::path::PathBuf;
use std::{env, fs, io};

use anyhow::{bail, Context, Result};
use clap::Args;
use log::warn;
use serde::de::DeserializeOwned;

use crate::dirs::ensure_dir_exists;

/// Command line flags shared by every subcommand that needs configuration.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// The config directory, default is `~/.config/mindcare` (or `/etc/mindcare`
    /// when running as root).
    #[arg(long, short)]
    pub config_path: Option<PathBuf>,

    /// The data directory, default is `~/.local/share/mindcare` (or
    /// `/var/lib/mindcare` when running as root).
    #[arg(long, short)]
    pub data_path: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn load<T>(&self, name: &str) -> Result<T>
    where
        T: CommonConfig + DeserializeOwned,
    {
        let ps = PathSet::new(self.config_path.clone(), self.data_path.clone())?;
        ps.load_config(name)
    }
}

pub struct PathSet {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub pki_dir: PathBuf,
}

impl PathSet {
    pub fn new(config_dir: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let is_root = unsafe { libc::geteuid() == 0 };

        let config_dir = if let Some(path) = config_dir {
            path
        } else if let Ok(path) = env::var("MINDCARE_CONFIG") {
            PathBuf::from(path)
        } else if is_root {
            PathBuf::from("/etc/mindcare")
        } else {
            Self::home_dir()?.join(".config").join("mindcare")
        };

        let data_dir = if let Some(path) = data_dir {
            path
        } else if let Ok(path) = env::var("MINDCARE_DATA") {
            PathBuf::from(path)
        } else if is_root {
            PathBuf::from("/var/lib/mindcare")
        } else {
            Self::home_dir()?.join(".local").join("share").join("mindcare")
        };

        let pki_dir = config_dir.join("pki");

        ensure_dir_exists(&config_dir)
            .with_context(|| format!("ensure config directory: {}", config_dir.display()))?;
        ensure_dir_exists(&data_dir)
            .with_context(|| format!("ensure data directory: {}", data_dir.display()))?;

        Ok(Self {
            config_dir,
            data_dir,
            pki_dir,
        })
    }

    pub fn load_config<T>(&self, name: &str) -> Result<T>
    where
        T: CommonConfig + DeserializeOwned,
    {
        let path = self.config_dir.join(format!("{name}.toml"));
        let mut cfg: T = match fs::read_to_string(&path) {
            Ok(s) => toml::from_str(&s)
                .with_context(|| format!("parse config file: {}", path.display()))?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("Config file for {name} not found, using defaults");
                T::default()
            }
            Err(err) => {
                return Err(err).with_context(|| format!("read config file: {}", path.display()));
            }
        };

        cfg.complete(self).context("validate config")?;
        Ok(cfg)
    }

    fn home_dir() -> Result<PathBuf> {
        match env::var_os("HOME").map(PathBuf::from) {
            Some(dir) => Ok(dir),
            None => bail!("could not determine home directory, please specify config path manually"),
        }
    }
}

pub trait CommonConfig: Default {
    fn complete(&mut self, ps: &PathSet) -> Result<()>;
}

/// See: [`shellexpand::full`].
pub fn expandenv(name: &str, s: impl AsRef<str>) -> Result<String> {
    let s =
        shellexpand::full(s.as_ref()).with_context(|| format!("expand env value for '{name}'"))?;
    Ok(s.to_string())
}
