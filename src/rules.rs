//! Classification rules: ordered regex-to-type-label pairs.
//!
//! A [`RuleSet`] is tried against a sample cell in declaration order. Under the
//! default [`MatchPolicy::Last`] every rule is evaluated and the label of the
//! last matching rule wins; [`MatchPolicy::First`] stops at the first match.
//! Patterns are searched, not fully matched, so only a rule's own `^`/`$`
//! anchors constrain where it may match.
//!
//! Rule sets are configuration. Besides the built-in default they can be
//! loaded from a YAML file:
//!
//! ```yaml
//! rules:
//!   - label: INTEGER
//!     pattern: '^-?\d+$'
//!   - label: REAL
//!     pattern: '^-?\d+\.\d+$'
//! ```

use std::{fs::File, io::BufReader, path::Path, sync::OnceLock};

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::LoadError;

const DEFAULT_RULES: &[(&str, &str)] = &[
    // SQLite has no boolean storage class; the label is kept for readability.
    ("BOOLEAN", r"^(true|false)|(yes|no)"),
    ("VARCHAR", r"^[a-z\sA-Z]+$"),
    ("INTEGER", r"^-?\d+$"),
    ("FLOAT", r"^-?\d+\.{1}\d+$"),
    // Dates are stored as text.
    ("TEXT", r"[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[1-2][0-9]|3[0-1])"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[value(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Evaluate every rule; the last match decides the label.
    #[default]
    Last,
    /// Stop at the first matching rule.
    First,
}

#[derive(Debug, Clone)]
pub struct ClassificationRule {
    label: String,
    pattern: Regex,
}

impl ClassificationRule {
    pub fn new(label: &str, pattern: &str) -> Result<Self, LoadError> {
        validate_type_label(label)?;
        let pattern = Regex::new(pattern).map_err(|err| {
            LoadError::Config(format!("Invalid pattern for rule '{label}': {err}"))
        })?;
        Ok(Self {
            label: label.to_string(),
            pattern,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn matches(&self, cell: &str) -> bool {
        self.pattern.is_match(cell)
    }
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    rules: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
struct RuleEntry {
    label: String,
    pattern: String,
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<ClassificationRule>,
    policy: MatchPolicy,
}

impl Default for RuleSet {
    fn default() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .map(|(label, pattern)| ClassificationRule {
                label: (*label).to_string(),
                pattern: Regex::new(pattern).expect("default rule patterns compile"),
            })
            .collect();
        Self {
            rules,
            policy: MatchPolicy::default(),
        }
    }
}

impl RuleSet {
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self {
            rules,
            policy: MatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|err| {
            LoadError::Config(format!("Opening rule file {path:?}: {err}"))
        })?;
        let parsed: RuleFile = serde_yaml::from_reader(BufReader::new(file)).map_err(|err| {
            LoadError::Config(format!("Parsing rule file {path:?}: {err}"))
        })?;
        if parsed.rules.is_empty() {
            return Err(LoadError::Config(format!(
                "Rule file {path:?} does not define any rules"
            )));
        }
        let rules = parsed
            .rules
            .iter()
            .map(|entry| ClassificationRule::new(&entry.label, &entry.pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    /// Returns the label assigned to `cell`, or an empty string when no rule
    /// matches.
    pub fn classify(&self, cell: &str) -> String {
        classify(cell, &self.rules, self.policy)
    }
}

pub fn classify(cell: &str, rules: &[ClassificationRule], policy: MatchPolicy) -> String {
    let matched = match policy {
        MatchPolicy::Last => rules
            .iter()
            .fold(None, |found, rule| {
                if rule.matches(cell) { Some(rule) } else { found }
            }),
        MatchPolicy::First => rules.iter().find(|rule| rule.matches(cell)),
    };
    matched.map(|rule| rule.label.clone()).unwrap_or_default()
}

/// Accepts plain SQL type tokens such as `INTEGER`, `DOUBLE PRECISION` or
/// `VARCHAR(255)`.
pub fn validate_type_label(label: &str) -> Result<(), LoadError> {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    let regex = LABEL.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_]*( [A-Za-z][A-Za-z0-9_]*)*(\(\d+(, ?\d+)?\))?$")
            .expect("label pattern compiles")
    });
    if regex.is_match(label) {
        Ok(())
    } else {
        Err(LoadError::Config(format!(
            "'{label}' is not a valid column type label"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn labels(set: &RuleSet, cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| set.classify(cell)).collect()
    }

    #[test]
    fn default_rules_classify_common_values() {
        let set = RuleSet::default();
        assert_eq!(
            labels(&set, &["alice", "30", "-5.2", "2020-01-15", "$12"]),
            vec!["VARCHAR", "INTEGER", "FLOAT", "TEXT", ""]
        );
    }

    #[test]
    fn last_match_wins_for_boolean_words() {
        // "true" matches the boolean rule and the later alphabetic rule.
        let set = RuleSet::default();
        assert_eq!(set.classify("true"), "VARCHAR");
        assert_eq!(set.classify("no"), "VARCHAR");
        // Digits after a boolean word defeat the alphabetic rule.
        assert_eq!(set.classify("yes1"), "BOOLEAN");
    }

    #[test]
    fn first_match_policy_prefers_earlier_rules() {
        let set = RuleSet::default().with_policy(MatchPolicy::First);
        assert_eq!(set.classify("true"), "BOOLEAN");
        assert_eq!(set.classify("alice"), "VARCHAR");
        assert_eq!(set.classify("30"), "INTEGER");
    }

    #[test]
    fn patterns_search_instead_of_full_match() {
        let set = RuleSet::new(vec![ClassificationRule::new("TEXT", "abc").unwrap()]);
        assert_eq!(set.classify("xxabcxx"), "TEXT");
    }

    #[test]
    fn rule_labels_must_be_type_tokens() {
        assert!(validate_type_label("INTEGER").is_ok());
        assert!(validate_type_label("VARCHAR(255)").is_ok());
        assert!(validate_type_label("DECIMAL(10,2)").is_ok());
        assert!(validate_type_label("DOUBLE PRECISION").is_ok());
        assert!(validate_type_label("").is_err());
        assert!(validate_type_label("TEXT); DROP TABLE x").is_err());
        assert!(ClassificationRule::new("INTEGER", "(").is_err());
    }

    #[test]
    fn load_reads_ordered_rules_from_yaml() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "rules:").unwrap();
        writeln!(file, "  - label: INTEGER").unwrap();
        writeln!(file, "    pattern: '^\\d+$'").unwrap();
        writeln!(file, "  - label: NUMERIC").unwrap();
        writeln!(file, "    pattern: '^\\d+(\\.\\d+)?$'").unwrap();

        let set = RuleSet::load(file.path()).expect("load rules");
        assert_eq!(set.rules().len(), 2);
        assert_eq!(set.rules()[0].pattern(), r"^\d+$");
        assert_eq!(set.classify("42"), "NUMERIC");
        assert_eq!(set.classify("4.2"), "NUMERIC");
        assert_eq!(set.classify("x"), "");
    }

    #[test]
    fn load_rejects_empty_rule_list() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "rules: []").unwrap();
        assert!(matches!(
            RuleSet::load(file.path()),
            Err(LoadError::Config(_))
        ));
    }

    proptest! {
        #[test]
        fn classify_returns_last_matching_label(cell in "[a-z0-9.-]{0,8}") {
            let set = RuleSet::default();
            let expected = set
                .rules()
                .iter()
                .rev()
                .find(|rule| rule.matches(&cell))
                .map(|rule| rule.label().to_string())
                .unwrap_or_default();
            prop_assert_eq!(set.classify(&cell), expected);
        }

        #[test]
        fn classify_label_is_empty_or_from_rule_set(cell in "\\PC{0,12}") {
            let set = RuleSet::default();
            let label = set.classify(&cell);
            prop_assert!(label.is_empty() || set.rules().iter().any(|rule| rule.label() == label));
        }
    }
}
