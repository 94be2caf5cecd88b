//! Rule entries and the ordered rule table.
//!
//! This module provides the [`Rule`] struct, mapping an alert name (and an
//! optional pattern on the alert value) to a sound file, and the [`RuleTable`]
//! holding the rules in configuration order.

use std::fmt;

use log::debug;
use regex::Regex;

use crate::playback::PlaybackTarget;

/// Associates an alert to the sound file played when it fires.
///
/// The alert name is compared case-insensitively. When a value pattern is
/// present, the alert also needs a value string in which the pattern is found
/// (search semantics: `bar` matches `"one bar two"`).
///
/// # Examples
///
/// ```
/// # use alertchime::rules::Rule;
/// let rule = Rule::new("foo", Some(regex::Regex::new(".*bar.*").unwrap()), "foo.mp3".into());
/// assert!(rule.matches_name("FOO"));
/// assert!(rule.matches_value(Some("one bar two")));
/// assert!(!rule.matches_value(Some("huh")));
/// ```
#[derive(Clone, Debug)]
pub struct Rule {
    /// Alert name as written in the configuration.
    name: String,
    /// Lowercase alert name used for comparisons.
    key: String,
    /// Optional condition on the alert value string.
    value_pattern: Option<Regex>,
    /// Sound file to play when the rule matches.
    target: PlaybackTarget,
}

impl Rule {
    /// Creates a new [`Rule`].
    ///
    /// # Arguments
    ///
    /// * `name` - Alert name to match, case-insensitively
    /// * `value_pattern` - Optional pattern searched in the alert value string
    /// * `target` - Sound file to play
    pub fn new(name: &str, value_pattern: Option<Regex>, target: PlaybackTarget) -> Self {
        Rule {
            name: name.to_owned(),
            key: name.to_lowercase(),
            value_pattern,
            target,
        }
    }

    /// Whether `alert_name` designates this rule.
    pub fn matches_name(&self, alert_name: &str) -> bool {
        self.key == alert_name.to_lowercase()
    }

    /// Whether the value condition of the rule holds for `value`.
    ///
    /// A rule without value pattern accepts anything, including a missing value.
    pub fn matches_value(&self, value: Option<&str>) -> bool {
        match (&self.value_pattern, value) {
            (None, _) => true,
            (Some(pattern), Some(value)) => pattern.is_match(value),
            (Some(_), None) => false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &PlaybackTarget {
        &self.target
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.value_pattern {
            Some(pattern) => write!(f, "{} ~ /{}/ -> {}", self.name, pattern, self.target),
            None => write!(f, "{} -> {}", self.name, self.target),
        }
    }
}

/// Ordered, read-only collection of [`Rule`]s.
///
/// The order is the one of the configuration file and is the evaluation order.
/// The table is built once at startup and shared behind an `Arc`; it is never
/// mutated afterwards so concurrent request handlers read it without locking.
#[derive(Clone, Debug, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        RuleTable { rules }
    }

    /// Finds the sound file to play for an alert.
    ///
    /// Only the first rule whose name matches `alert_name` is considered. If its
    /// value condition fails, there is no match: later rules with the same name
    /// are not tried.
    ///
    /// # Returns
    ///
    /// The target of the matching rule, or `None`.
    pub fn lookup(&self, alert_name: &str, value: Option<&str>) -> Option<&PlaybackTarget> {
        let rule = self.rules.iter().find(|rule| rule.matches_name(alert_name))?;

        if rule.matches_value(value) {
            debug!("alert {} matched rule {}", alert_name, rule);
            Some(rule.target())
        } else {
            debug!(
                "alert {} with value {:?} does not satisfy rule {}",
                alert_name, value, rule
            );
            None
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, pattern: Option<&str>, target: &str) -> Rule {
        Rule::new(name, pattern.map(|p| Regex::new(p).unwrap()), target.into())
    }

    #[test]
    fn test_name_is_case_insensitive() {
        let rule = rule("foo", None, "foo.mp3");
        assert!(rule.matches_name("Foo"));
        assert!(rule.matches_name("FOO"));
        assert!(!rule.matches_name("foobar"));
    }

    #[test]
    fn test_value_pattern_is_searched() {
        let rule = rule("foo", Some("bar"), "foo.mp3");
        assert!(rule.matches_value(Some("one bar two")));
        assert!(!rule.matches_value(Some("huh")));
        assert!(!rule.matches_value(None));
    }

    #[test]
    fn test_no_pattern_accepts_any_value() {
        let rule = rule("foo", None, "foo.mp3");
        assert!(rule.matches_value(None));
        assert!(rule.matches_value(Some("anything")));
    }

    #[test]
    fn test_lookup_first_name_match_wins() {
        let table = RuleTable::new(vec![
            rule("foo", None, "first.mp3"),
            rule("foo", None, "second.mp3"),
        ]);

        assert_eq!(
            table.lookup("foo", None).unwrap(),
            &PlaybackTarget::from("first.mp3")
        );
    }

    #[test]
    fn test_lookup_stops_at_first_name_match() {
        let table = RuleTable::new(vec![
            rule("foo", Some("bar"), "first.mp3"),
            rule("foo", None, "second.mp3"),
        ]);

        assert!(table.lookup("foo", Some("huh")).is_none());
        assert_eq!(
            table.lookup("foo", Some("one bar two")).unwrap(),
            &PlaybackTarget::from("first.mp3")
        );
    }

    #[test]
    fn test_lookup_unknown_name() {
        let table = RuleTable::new(vec![rule("foo", None, "foo.mp3")]);
        assert!(table.lookup("bar", None).is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(rule("foo", None, "foo.mp3").to_string(), "foo -> foo.mp3");
        assert_eq!(
            rule("foo", Some(".*bar.*"), "foo.mp3").to_string(),
            "foo ~ /.*bar.*/ -> foo.mp3"
        );
    }
}
