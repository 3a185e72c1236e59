use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use client_core::{
    config::{DEFAULT_BACKEND_URL, DEFAULT_DISPLAY_NAME, DEFAULT_POLL_INTERVAL},
    ClientConfig,
};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "chat.toml";

#[derive(Parser, Debug, Default)]
#[command(about = "Terminal front end for the realtime chat backend")]
pub struct Args {
    /// Base http(s) URL of the chat backend.
    #[arg(long)]
    pub backend_url: Option<String>,
    /// Display name used by `/connect` without an argument.
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub poll_interval_secs: Option<u64>,
    /// Settings file; a missing file is not an error.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
    /// Connect immediately instead of waiting for `/connect`.
    #[arg(long)]
    pub auto_connect: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: String,
    pub username: String,
    pub poll_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            username: DEFAULT_DISPLAY_NAME.into(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    backend_url: Option<String>,
    username: Option<String>,
    poll_interval_secs: Option<u64>,
}

/// Defaults, then the settings file, then the environment, then CLI flags.
pub fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(&args.config) {
        Ok(raw) => settings
            .apply_file(&raw)
            .with_context(|| format!("invalid settings file '{}'", args.config.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read '{}'", args.config.display()));
        }
    }

    settings.apply_env(|key| std::env::var(key).ok());
    settings.apply_args(args);
    Ok(settings)
}

impl Settings {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            backend_url: self.backend_url.clone(),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            ..ClientConfig::default()
        }
    }

    fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let file_cfg: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file_cfg.backend_url {
            self.backend_url = v;
        }
        if let Some(v) = file_cfg.username {
            self.username = v;
        }
        if let Some(v) = file_cfg.poll_interval_secs {
            self.poll_interval_secs = v;
        }
        Ok(())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("CHAT_BACKEND_URL") {
            self.backend_url = v;
        }
        if let Some(v) = var("APP__BACKEND_URL") {
            self.backend_url = v;
        }

        if let Some(v) = var("CHAT_USERNAME") {
            self.username = v;
        }

        if let Some(v) = var("APP__POLL_INTERVAL_SECS") {
            if let Ok(parsed) = v.trim().parse::<u64>() {
                self.poll_interval_secs = parsed;
            }
        }
    }

    fn apply_args(&mut self, args: &Args) {
        if let Some(v) = &args.backend_url {
            self.backend_url = v.clone();
        }
        if let Some(v) = &args.username {
            self.username = v.clone();
        }
        if let Some(v) = args.poll_interval_secs {
            self.poll_interval_secs = v;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
