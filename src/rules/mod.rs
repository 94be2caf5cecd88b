//! Rules deciding which sound file an alert plays.
//!
//! - [`Rule`]: one alert name, an optional value pattern and the file to play
//! - [`RuleTable`]: the ordered rules, evaluated first match first
//! - [`RuleLoader`]: builds the table from the `[mp3match]` configuration section
//!
//! # Example Usage
//!
//! ```no_run
//! use alertchime::rules::RuleLoader;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let rules = RuleLoader::new("alert.toml").load().await?;
//! if let Some(target) = rules.lookup("Front door open", None) {
//!     println!("would play {}", target);
//! }
//! # Ok(())
//! # }
//! ```

mod rule;
mod rule_loader;

pub use crate::rules::rule::{Rule, RuleTable};
pub use crate::rules::rule_loader::RuleLoader;
