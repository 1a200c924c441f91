//! Client configuration from the environment and command line
//!
//! Values are read from `GLIDE_*` environment variables first; command-line
//! flags override them. Presence is checked by [`GlideConfig::validate`] before
//! any request is made.

use crate::glide::error::{GlideError, Result};
use crate::glide::transport::DEFAULT_API_ROOT;

pub const ENV_TOKEN: &str = "GLIDE_TOKEN";
pub const ENV_APP_ID: &str = "GLIDE_APP_ID";
pub const ENV_TABLE_NAME: &str = "GLIDE_TABLE_NAME";
pub const ENV_API_ROOT: &str = "GLIDE_API_ROOT";
pub const ENV_MAX_PAGES: &str = "GLIDE_MAX_PAGES";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlideConfig {
    /// Application ID sent as `appID` in every request
    pub app_id: String,

    /// Table operated on by the CLI commands
    pub table_name: String,

    /// Bearer token
    pub token: String,

    /// Root of the function API (default: `https://api.glideapp.io/api/function`)
    pub api_root: String,

    /// Optional cap on pages per table read; unbounded when `None`
    pub max_pages: Option<usize>,
}

impl GlideConfig {
    /// Load from the process environment and validate
    pub fn from_env() -> Result<Self> {
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an arbitrary key lookup without validating presence
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_pages = match lookup(ENV_MAX_PAGES) {
            Some(raw) if !raw.trim().is_empty() => Some(parse_max_pages(&raw)?),
            _ => None,
        };

        Ok(GlideConfig {
            app_id: lookup(ENV_APP_ID).unwrap_or_default(),
            table_name: lookup(ENV_TABLE_NAME).unwrap_or_default(),
            token: lookup(ENV_TOKEN).unwrap_or_default(),
            api_root: lookup(ENV_API_ROOT)
                .filter(|root| !root.is_empty())
                .unwrap_or_else(|| DEFAULT_API_ROOT.to_string()),
            max_pages,
        })
    }

    /// Apply command-line overrides and return the remaining arguments
    ///
    /// Recognised flags: `--appId`, `--table`, `--token`, `--apiRoot`,
    /// `--maxPages`. Everything else is passed through in order.
    pub fn apply_args(&mut self, args: &[String]) -> Result<Vec<String>> {
        let mut rest = Vec::new();
        let mut i = 0;
        while i < args.len() {
            let value = args.get(i + 1);
            match (args[i].as_str(), value) {
                ("--appId", Some(v)) => self.app_id = v.clone(),
                ("--table", Some(v)) => self.table_name = v.clone(),
                ("--token", Some(v)) => self.token = v.clone(),
                ("--apiRoot", Some(v)) => self.api_root = v.clone(),
                ("--maxPages", Some(v)) => self.max_pages = Some(parse_max_pages(v)?),
                (flag @ ("--appId" | "--table" | "--token" | "--apiRoot" | "--maxPages"), None) => {
                    return Err(GlideError::Config(format!("{} requires a value", flag)));
                }
                (other, _) => {
                    rest.push(other.to_string());
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }
        Ok(rest)
    }

    /// Check that the token is set
    pub fn require_token(&self) -> Result<&str> {
        if self.token.is_empty() {
            return Err(GlideError::Config(format!(
                "{} is not set in the environment.",
                ENV_TOKEN
            )));
        }
        Ok(&self.token)
    }

    /// Check that token, app ID and table name are all set
    pub fn validate(&self) -> Result<()> {
        self.require_token()?;
        if self.app_id.is_empty() || self.table_name.is_empty() {
            return Err(GlideError::Config(format!(
                "{} or {} is not set in the environment.",
                ENV_APP_ID, ENV_TABLE_NAME
            )));
        }
        Ok(())
    }
}

fn parse_max_pages(raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(GlideError::Config(format!(
            "Invalid page limit '{}': expected a positive integer",
            raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = GlideConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_root, DEFAULT_API_ROOT);
        assert_eq!(config.max_pages, None);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_lookup_complete() {
        let config = GlideConfig::from_lookup(lookup(&[
            (ENV_TOKEN, "tok"),
            (ENV_APP_ID, "app"),
            (ENV_TABLE_NAME, "Orders"),
            (ENV_MAX_PAGES, "50"),
        ]))
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_pages, Some(50));
    }

    #[test]
    fn test_missing_table_is_config_error() {
        let config =
            GlideConfig::from_lookup(lookup(&[(ENV_TOKEN, "tok"), (ENV_APP_ID, "app")])).unwrap();
        match config.validate() {
            Err(GlideError::Config(msg)) => assert!(msg.contains(ENV_TABLE_NAME)),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_token_is_config_error() {
        let config = GlideConfig::from_lookup(lookup(&[
            (ENV_APP_ID, "app"),
            (ENV_TABLE_NAME, "Orders"),
        ]))
        .unwrap();
        assert!(matches!(config.validate(), Err(GlideError::Config(_))));
    }

    #[test]
    fn test_invalid_max_pages() {
        assert!(GlideConfig::from_lookup(lookup(&[(ENV_MAX_PAGES, "zero")])).is_err());
        assert!(GlideConfig::from_lookup(lookup(&[(ENV_MAX_PAGES, "0")])).is_err());
    }

    #[test]
    fn test_args_override_env() {
        let mut config = GlideConfig::from_lookup(lookup(&[(ENV_APP_ID, "env-app")])).unwrap();
        let rest = config
            .apply_args(&args(&[
                "--appId", "cli-app", "query", "--token", "t", "--maxPages", "3",
            ]))
            .unwrap();

        assert_eq!(rest, args(&["query"]));
        assert_eq!(config.app_id, "cli-app");
        assert_eq!(config.token, "t");
        assert_eq!(config.max_pages, Some(3));
    }

    #[test]
    fn test_flag_without_value() {
        let mut config = GlideConfig::default();
        assert!(config.apply_args(&args(&["query", "--table"])).is_err());
    }
}
