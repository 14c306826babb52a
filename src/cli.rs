//! Clap adapter for confighub.
//!
//! This module is the **optional integration layer** between the session
//! builder and the [clap](https://docs.rs/clap) CLI parser. It is compiled
//! only when the `clap` Cargo feature is enabled (on by default).
//!
//! [`ConnectionArgs`] is a clap derive type you can flatten into your own
//! `#[derive(Parser)]` struct to get `--token`, `--context`, `--tag` and the
//! other connection flags with no boilerplate.
//!
//! Flags sit on top of [`Settings`]: [`ConnectionArgs::into_builder()`]
//! loads the settings file (explicit `--settings` path, or the platform
//! default) and environment, then applies whatever was given on the command
//! line. If you use a different CLI parser, skip this module and call the
//! [`ConfigHubBuilder`] setters directly.

use std::path::PathBuf;

use clap::Args;

use crate::client::{ConfigHub, ConfigHubBuilder};
use crate::error::ConfigHubError;
use crate::settings::Settings;

/// Connection flags for a ConfigHub session.
///
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(flatten)]
///     confighub: ConnectionArgs,
/// }
///
/// let mut hub = Cli::parse().confighub.into_builder()?.build()?;
/// hub.pull()?;
/// ```
#[derive(Debug, Default, Args)]
pub struct ConnectionArgs {
    /// Settings file to load instead of the platform default.
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// ConfigHub server, host with optional port.
    #[arg(long)]
    pub server: Option<String>,

    /// Use plain http.
    #[arg(long)]
    pub insecure: bool,

    /// Repository token.
    #[arg(long, conflicts_with_all = ["account", "repository"])]
    pub token: Option<String>,

    /// Repository owner, for token-less access.
    #[arg(long, requires = "repository")]
    pub account: Option<String>,

    /// Repository name, for token-less access.
    #[arg(long, requires = "account")]
    pub repository: Option<String>,

    /// Semicolon-delimited context (e.g. "Production;MyApp").
    #[arg(long)]
    pub context: Option<String>,

    /// Application name reported to the service.
    #[arg(long = "app-name", value_name = "NAME")]
    pub application_name: Option<String>,

    /// Pull the configuration as of this tag.
    #[arg(long)]
    pub tag: Option<String>,

    /// Pull the configuration as of this date (YYYY-MM-DDTHH:MM:SSZ).
    #[arg(long)]
    pub date: Option<String>,

    /// Decrypt a security group server-side. Repeatable.
    #[arg(long = "decrypt", value_name = "GROUP=PASSWORD", value_parser = parse_security_group)]
    pub security_groups: Vec<(String, String)>,

    /// Include key comments in the pull.
    #[arg(long)]
    pub include_comments: bool,

    /// Include the context of each value in the pull.
    #[arg(long)]
    pub include_value_context: bool,
}

impl ConnectionArgs {
    /// Settings from `--settings`, or from the platform default location.
    pub fn load_settings(&self) -> Result<Settings, ConfigHubError> {
        match &self.settings {
            Some(path) => Settings::load(path),
            None => Settings::discover(),
        }
    }

    /// Load settings, then layer the command-line flags on top.
    pub fn into_builder(self) -> Result<ConfigHubBuilder, ConfigHubError> {
        let settings = self.load_settings()?;
        Ok(self.apply(ConfigHub::builder().settings(&settings)))
    }

    /// Apply only the flags that were given. Boolean flags can switch a
    /// setting on but never off.
    pub fn apply(self, mut builder: ConfigHubBuilder) -> ConfigHubBuilder {
        if let Some(server) = &self.server {
            builder = builder.server(server);
        }
        if self.insecure {
            builder = builder.secure(false);
        }
        if let Some(token) = &self.token {
            builder = builder.token(token);
        }
        if let Some(account) = &self.account {
            builder = builder.account(account);
        }
        if let Some(repository) = &self.repository {
            builder = builder.repository(repository);
        }
        if let Some(context) = &self.context {
            builder = builder.context(context);
        }
        if let Some(name) = &self.application_name {
            builder = builder.application_name(name);
        }
        if let Some(tag) = &self.tag {
            builder = builder.tag(tag);
        }
        if let Some(date) = &self.date {
            builder = builder.date(date);
        }
        for (group, password) in &self.security_groups {
            builder = builder.decrypt_security_group(group, password);
        }
        if self.include_comments {
            builder = builder.include_comments(true);
        }
        if self.include_value_context {
            builder = builder.include_value_context(true);
        }
        builder
    }
}

fn parse_security_group(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((group, password)) if !group.is_empty() => {
            Ok((group.to_string(), password.to_string()))
        }
        _ => Err(format!("expected GROUP=PASSWORD, got '{s}'")),
    }
}
