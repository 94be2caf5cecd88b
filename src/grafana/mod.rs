//! Grafana alert payloads and their evaluation.
//!
//! # Modules
//!
//! - `notification` - deserialization of the webhook body into a [`Notification`]
//! - `matcher` - [`evaluate`], resolving a notification into the sound files to play
//!
//! # Examples
//!
//! ```no_run
//! use alertchime::grafana::{evaluate, Notification};
//! use alertchime::rules::RuleLoader;
//!
//! # async fn example(body: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let rules = RuleLoader::new("alert.toml").load().await?;
//! let notification = Notification::from_slice(body)?;
//! for target in evaluate(&notification, &rules)? {
//!     println!("play {}", target);
//! }
//! # Ok(())
//! # }
//! ```

mod matcher;
mod notification;

pub use crate::grafana::matcher::{MatchError, evaluate};
pub use crate::grafana::notification::{AlertBatch, AlertItem, LegacyAlert, Notification};
