//! Rule table loading from the configuration file.
//!
//! This module provides the [`RuleLoader`] which reads the `[mp3match]` section of
//! the TOML configuration file into a [`RuleTable`]. Each key is the path of a sound
//! file, each value is either an alert name or a `[name, pattern]` pair:
//!
//! ```toml
//! [mp3match]
//! "sounds/door.mp3" = "Front door open"
//! "sounds/co2.mp3" = ["CO2 level", "[0-9]{4}"]
//! ```
//!
//! The section is read with the `toml` crate rather than through figment so
//! that the rules keep the order in which they are written.

use std::path::{Path, PathBuf};

use log::{debug, info};
use regex::Regex;
use thiserror::Error;
use tokio::fs;
use toml::{Table, Value};

use crate::{
    playback::PlaybackTarget,
    rules::{Rule, RuleTable},
};

/// Name of the configuration section holding the rules.
pub const SECTION: &str = "mp3match";

/// Extension every sound file must have, the default player being `mpg123`.
const MEDIA_SUFFIX: &str = ".mp3";

/// Errors raised while building the rule table.
#[derive(Debug, Error)]
pub enum RuleLoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config file {} does not include the [{}] section", .0.display(), SECTION)]
    MissingSection(PathBuf),
    #[error("invalid rule for '{file}': {reason}")]
    InvalidRule { file: String, reason: String },
    #[error("invalid pattern for '{file}': {source}")]
    InvalidPattern { file: String, source: regex::Error },
    #[error("file '{0}' does not end with {suffix}", suffix = MEDIA_SUFFIX)]
    UnsupportedMedia(String),
    #[error("file '{file}' cannot be opened for reading: {source}")]
    UnreadableMedia {
        file: String,
        source: std::io::Error,
    },
}

/// Reads rules from a TOML configuration file.
///
/// Relative sound file paths are resolved against the directory of the
/// configuration file, so the service can be started from anywhere.
///
/// # Examples
///
/// ```no_run
/// use alertchime::rules::RuleLoader;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let loader = RuleLoader::new("alert.toml");
/// let rules = loader.load().await?;
/// println!("loaded {} rules", rules.len());
/// # Ok(())
/// # }
/// ```
pub struct RuleLoader {
    /// Path of the configuration file.
    path: PathBuf,
}

impl RuleLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RuleLoader { path: path.into() }
    }

    /// Loads and validates the rule table.
    ///
    /// Every sound file is opened once to make sure it is readable. This is only
    /// a startup check: the playback worker checks again before playing.
    ///
    /// # Errors
    ///
    /// - The file cannot be read or is not valid TOML
    /// - The `[mp3match]` section is missing
    /// - A value is neither a string nor a `[name, pattern]` pair
    /// - A pattern is not a valid regular expression
    /// - A sound file does not end with `.mp3` or cannot be opened
    pub async fn load(&self) -> Result<RuleTable, RuleLoadError> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|source| RuleLoadError::Io {
                path: self.path.clone(),
                source,
            })?;

        let document: Table = content.parse().map_err(|source| RuleLoadError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let Some(Value::Table(section)) = document.get(SECTION) else {
            return Err(RuleLoadError::MissingSection(self.path.clone()));
        };

        let mut rules = Vec::with_capacity(section.len());
        for (file, params) in section {
            debug!("checking file '{}'", file);
            let target = self.check_media(file).await?;
            let rule = parse_rule(file, params, target)?;
            debug!("loaded rule {}", rule);
            rules.push(rule);
        }

        info!("loaded {} rules from {}", rules.len(), self.path.display());

        Ok(RuleTable::new(rules))
    }

    async fn check_media(&self, file: &str) -> Result<PlaybackTarget, RuleLoadError> {
        if !file.ends_with(MEDIA_SUFFIX) {
            return Err(RuleLoadError::UnsupportedMedia(file.to_owned()));
        }

        let resolved = self.resolve(file);
        fs::File::open(&resolved)
            .await
            .map_err(|source| RuleLoadError::UnreadableMedia {
                file: file.to_owned(),
                source,
            })?;

        Ok(PlaybackTarget::new(resolved))
    }

    fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        match self.path.parent() {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

fn parse_rule(file: &str, params: &Value, target: PlaybackTarget) -> Result<Rule, RuleLoadError> {
    let invalid = |reason: &str| RuleLoadError::InvalidRule {
        file: file.to_owned(),
        reason: reason.to_owned(),
    };

    match params {
        Value::String(name) => Ok(Rule::new(name, None, target)),
        Value::Array(pair) => match pair.as_slice() {
            [Value::String(name), Value::String(pattern)] => {
                let pattern = Regex::new(pattern).map_err(|source| {
                    RuleLoadError::InvalidPattern {
                        file: file.to_owned(),
                        source,
                    }
                })?;
                Ok(Rule::new(name, Some(pattern), target))
            }
            _ => Err(invalid("expected [alert name, value pattern]")),
        },
        _ => Err(invalid("expected an alert name or [alert name, value pattern]")),
    }
}
