#![forbid(unsafe_code)]

//! Core value types shared by the registry and the dispatcher

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static FLAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:-(?P<short>[A-Za-z0-9])|--(?P<long>[A-Za-z0-9][A-Za-z0-9_-]*))$")
        .unwrap_or_else(|e| panic!("flag pattern must compile: {e}"))
});

/// The kind of value an argument produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Free-form string value
    Str,
    /// Signed 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// Option taking an explicit `true` or `false`
    Bool,
    /// Flag without a value; presence flips the default
    Switch,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Str => "str",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::Switch => "switch",
        }
    }

    /// Whether `value` is a valid default for this kind
    ///
    /// Integers are accepted for floats since clap parses `"3"` as `3.0`.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ValueKind::Str, Value::Str(_))
                | (ValueKind::Int, Value::Int(_))
                | (ValueKind::Float, Value::Float(_) | Value::Int(_))
                | (ValueKind::Bool | ValueKind::Switch, Value::Bool(_))
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed (or default) argument value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    /// Name of the kind this value belongs to, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "str",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// A single command-line flag, split into its short or long form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag<'a> {
    /// `-v`
    Short(char),
    /// `--verbose`, stored without the leading dashes
    Long(&'a str),
}

impl<'a> Flag<'a> {
    /// Parses a flag such as `-v` or `--verbose`
    ///
    /// Returns `None` for anything that is not a single-character short flag
    /// or a long flag made of alphanumerics, `-` and `_`.
    pub fn parse(flag: &'a str) -> Option<Flag<'a>> {
        let caps = FLAG_PATTERN.captures(flag)?;
        if let Some(short) = caps.name("short") {
            return short.as_str().chars().next().map(Flag::Short);
        }
        caps.name("long").map(|long| Flag::Long(long.as_str()))
    }
}

/// Errors raised by the typed accessors of [`ArgBag`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgBagError {
    /// No value was parsed or defaulted for this destination
    #[error("no value for argument '{0}'")]
    Missing(String),

    /// A value exists but has a different kind
    #[error("argument '{dest}' is a {found}, expected {expected}")]
    WrongKind {
        dest: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Destination key to value mapping handed to every handler
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArgBag {
    values: BTreeMap<String, Value>,
}

impl ArgBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, replacing any previous value for the same key
    pub fn insert(&mut self, dest: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(dest.into(), value.into());
    }

    pub fn get(&self, dest: &str) -> Option<&Value> {
        self.values.get(dest)
    }

    pub fn contains(&self, dest: &str) -> bool {
        self.values.contains_key(dest)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over all values in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_str(&self, dest: &str) -> Result<&str, ArgBagError> {
        match self.require(dest)? {
            Value::Str(s) => Ok(s),
            other => Err(wrong_kind(dest, "str", other)),
        }
    }

    pub fn get_int(&self, dest: &str) -> Result<i64, ArgBagError> {
        match self.require(dest)? {
            Value::Int(i) => Ok(*i),
            other => Err(wrong_kind(dest, "int", other)),
        }
    }

    pub fn get_float(&self, dest: &str) -> Result<f64, ArgBagError> {
        match self.require(dest)? {
            Value::Float(x) => Ok(*x),
            other => Err(wrong_kind(dest, "float", other)),
        }
    }

    pub fn get_bool(&self, dest: &str) -> Result<bool, ArgBagError> {
        match self.require(dest)? {
            Value::Bool(b) => Ok(*b),
            other => Err(wrong_kind(dest, "bool", other)),
        }
    }

    fn require(&self, dest: &str) -> Result<&Value, ArgBagError> {
        self.values
            .get(dest)
            .ok_or_else(|| ArgBagError::Missing(dest.to_string()))
    }
}

fn wrong_kind(dest: &str, expected: &'static str, found: &Value) -> ArgBagError {
    ArgBagError::WrongKind {
        dest: dest.to_string(),
        expected,
        found: found.kind_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_parse_short_and_long() {
        assert_eq!(Flag::parse("-v"), Some(Flag::Short('v')));
        assert_eq!(Flag::parse("--verbose"), Some(Flag::Long("verbose")));
        assert_eq!(Flag::parse("--dry-run"), Some(Flag::Long("dry-run")));
        assert_eq!(Flag::parse("--with_underscore"), Some(Flag::Long("with_underscore")));
    }

    #[test]
    fn test_kind_accepts_matching_defaults() {
        assert!(ValueKind::Str.accepts(&Value::from("all")));
        assert!(ValueKind::Int.accepts(&Value::Int(1)));
        assert!(ValueKind::Float.accepts(&Value::Int(3)));
        assert!(ValueKind::Switch.accepts(&Value::Bool(false)));

        assert!(!ValueKind::Int.accepts(&Value::from("many")));
        assert!(!ValueKind::Int.accepts(&Value::Bool(true)));
        assert!(!ValueKind::Int.accepts(&Value::Float(0.5)));
        assert!(!ValueKind::Str.accepts(&Value::Int(5)));
    }

    #[test]
    fn test_flag_parse_rejects_malformed() {
        for bad in ["", "-", "--", "v", "-vv", "---all", "--all flag", "-?", "--=x"] {
            assert_eq!(Flag::parse(bad), None, "'{bad}' should be rejected");
        }
    }

    #[test]
    fn test_bag_typed_access() {
        let mut bag = ArgBag::new();
        bag.insert("name", "DEV1");
        bag.insert("count", 3i64);
        bag.insert("ratio", 0.5f64);
        bag.insert("all", true);

        assert_eq!(bag.get_str("name").unwrap(), "DEV1");
        assert_eq!(bag.get_int("count").unwrap(), 3);
        assert_eq!(bag.get_float("ratio").unwrap(), 0.5);
        assert!(bag.get_bool("all").unwrap());
        assert_eq!(bag.len(), 4);
    }

    #[test]
    fn test_bag_missing_and_wrong_kind() {
        let mut bag = ArgBag::new();
        bag.insert("all", false);

        assert_eq!(
            bag.get_str("nothing"),
            Err(ArgBagError::Missing("nothing".to_string()))
        );
        assert_eq!(
            bag.get_int("all"),
            Err(ArgBagError::WrongKind {
                dest: "all".to_string(),
                expected: "int",
                found: "bool",
            })
        );
    }

    #[test]
    fn test_bag_iterates_in_key_order() {
        let mut bag = ArgBag::new();
        bag.insert("zeta", 1i64);
        bag.insert("alpha", 2i64);

        let keys: Vec<&str> = bag.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from("x").to_string(), "x");
        assert_eq!(Value::Int(-4).to_string(), "-4");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::Bool(false).to_string(), "false");
    }
}
