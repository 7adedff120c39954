//! Token rules
//!
//! A rule set is an ordered list of named rules. The lexer tries them in
//! order at every cursor position and the first one that produces a
//! non-empty match wins, even if a later rule would consume more text.
//!
//! Rule sets are usually loaded from JSON:
//!
//! ```text
//! {
//!   "NUMBER":   { "match": { "head": "[0-9]", "tail": "[0-9.]", "limit": { ".": 1 } } },
//!   "COMMENT":  { "boundary": { "start": "/*", "end": "*/" } },
//!   "ARROW":    { "equals": "->" },
//!   "OPERATOR": { "in": ["+", "-"] },
//!   "SPACE":    { "match": "[ \\t]" }
//! }
//! ```
//!
//! Key order in the document is the priority order.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::utils::{Error, Result};

const BUILTIN_RULES: &str = include_str!("default_rules.json");

/// A single-character test compiled from a regex fragment such as `[0-9]`
#[derive(Clone)]
pub struct CharClass {
    pattern: String,
    regex: Regex,
}

impl CharClass {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{})$", pattern))
            .map_err(|e| Error::Config(format!("invalid character class {:?}: {}", pattern, e)))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Check whether `c` belongs to the class
    pub fn matches(&self, c: char) -> bool {
        let mut buf = [0u8; 4];
        self.regex.is_match(c.encode_utf8(&mut buf))
    }
}

impl fmt::Debug for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CharClass({:?})", self.pattern)
    }
}

impl PartialEq for CharClass {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

/// Head/tail character pattern with optional per-character repeat caps
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pattern {
    /// Required leading character
    pub head: Option<CharClass>,
    /// Greedily consumed following characters
    pub tail: Option<CharClass>,
    /// Maximum number of times a character may appear in the tail
    pub limit: BTreeMap<char, usize>,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head(mut self, class: &str) -> Result<Self> {
        self.head = Some(CharClass::new(class)?);
        Ok(self)
    }

    pub fn tail(mut self, class: &str) -> Result<Self> {
        self.tail = Some(CharClass::new(class)?);
        Ok(self)
    }

    pub fn limit(mut self, c: char, max: usize) -> Self {
        self.limit.insert(c, max);
        self
    }
}

/// How one token type is recognized
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Exact literal
    Equals(String),
    /// First matching literal of the list
    OneOf(Vec<String>),
    /// Character-class pattern
    Pattern(Pattern),
    /// Text from `start` up to (not including) the next `end`
    Boundary { start: String, end: String },
}

impl Rule {
    pub fn equals(literal: impl Into<String>) -> Self {
        Self::Equals(literal.into())
    }

    pub fn one_of<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf(literals.into_iter().map(Into::into).collect())
    }

    pub fn boundary(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self::Boundary {
            start: start.into(),
            end: end.into(),
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        match self {
            Rule::Equals(literal) if literal.is_empty() => {
                Err(Error::invalid_rule(name, "equals literal is empty"))
            }
            Rule::OneOf(literals) if literals.is_empty() => {
                Err(Error::invalid_rule(name, "in list is empty"))
            }
            Rule::OneOf(literals) if literals.iter().any(String::is_empty) => {
                Err(Error::invalid_rule(name, "in list contains an empty literal"))
            }
            Rule::Pattern(p) if p.head.is_none() && p.tail.is_none() => {
                Err(Error::invalid_rule(name, "pattern needs a head or a tail"))
            }
            Rule::Boundary { start, .. } if start.is_empty() => {
                Err(Error::invalid_rule(name, "boundary start is empty"))
            }
            Rule::Boundary { end, .. } if end.is_empty() => {
                Err(Error::invalid_rule(name, "boundary end is empty"))
            }
            _ => Ok(()),
        }
    }
}

impl From<Pattern> for Rule {
    fn from(p: Pattern) -> Self {
        Rule::Pattern(p)
    }
}

/// Ordered collection of named rules
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleSet {
    rules: Vec<(String, Rule)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The rules of the Pipescript language
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_RULES)
    }

    /// Parse a JSON rule document. Malformed JSON is [`Error::Config`],
    /// a well-formed but unusable rule is [`Error::InvalidRule`].
    pub fn from_json(text: &str) -> Result<Self> {
        let entries: RuleEntries = serde_json::from_str(text)?;

        let mut set = RuleSet::new();
        for (name, config) in entries.0 {
            let rule = config.into_rule(&name)?;
            set.push(name, rule)?;
        }
        Ok(set)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Append a rule at the lowest priority
    pub fn push(&mut self, name: impl Into<String>, rule: Rule) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid_rule(&name, "rule name is empty"));
        }
        if self.get(&name).is_some() {
            return Err(Error::invalid_rule(&name, "duplicate rule name"));
        }
        rule.validate(&name)?;
        self.rules.push((name, rule));
        Ok(())
    }

    /// Builder form of [`RuleSet::push`]
    pub fn with(mut self, name: impl Into<String>, rule: impl Into<Rule>) -> Result<Self> {
        self.push(name, rule.into())?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    /// Rules in priority order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ==================== JSON form ====================

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum RuleConfig {
    Equals(String),
    In(Vec<String>),
    Match(MatchConfig),
    Boundary(BoundaryConfig),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MatchConfig {
    Simple(String),
    Detailed(PatternConfig),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PatternConfig {
    head: Option<String>,
    tail: Option<String>,
    #[serde(default)]
    limit: BTreeMap<char, usize>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BoundaryConfig {
    start: String,
    end: String,
}

impl RuleConfig {
    fn into_rule(self, name: &str) -> Result<Rule> {
        let class = |pattern: &str| {
            CharClass::new(pattern).map_err(|e| Error::invalid_rule(name, e.to_string()))
        };

        Ok(match self {
            RuleConfig::Equals(literal) => Rule::Equals(literal),
            RuleConfig::In(literals) => Rule::OneOf(literals),
            // A bare class is a tail-only pattern
            RuleConfig::Match(MatchConfig::Simple(tail)) => Rule::Pattern(Pattern {
                head: None,
                tail: Some(class(&tail)?),
                limit: BTreeMap::new(),
            }),
            RuleConfig::Match(MatchConfig::Detailed(p)) => Rule::Pattern(Pattern {
                head: p.head.as_deref().map(class).transpose()?,
                tail: p.tail.as_deref().map(class).transpose()?,
                limit: p.limit,
            }),
            RuleConfig::Boundary(b) => Rule::Boundary {
                start: b.start,
                end: b.end,
            },
        })
    }
}

/// Rule entries in document order
struct RuleEntries(Vec<(String, RuleConfig)>);

impl<'de> Deserialize<'de> for RuleEntries {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RuleEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from rule name to rule")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<RuleEntries, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                // Entries arrive in document order, which is the priority order
                while let Some(entry) = map.next_entry::<String, RuleConfig>()? {
                    entries.push(entry);
                }
                Ok(RuleEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
