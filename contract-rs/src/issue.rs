//! Structured validation issues.
//!
//! An [`Issue`] is one reported failure with a code from a fixed taxonomy,
//! the path of the failing value, its RFC 6901 pointer, an English detail
//! string and constraint metadata. Issues are collected per request into an
//! [`IssueCollection`] and are never raised individually.
//!
//! # Example
//! ```rust
//! use contract_rs::issue::{Issue, IssueCode, PathSegment};
//!
//! let issue = Issue::required(vec![PathSegment::from("a/b")]);
//! assert_eq!(issue.code, IssueCode::Required);
//! assert_eq!(issue.pointer, "/a~1b");
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pipeline::KeyCase;

// =============================================================================
// Issue codes
// =============================================================================

/// Fixed taxonomy of validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// A required key is absent
    Required,
    /// A key is not declared by the object shape
    FieldUnknown,
    /// The value has the wrong type or does not match any variant
    ValueInvalid,
    NumberTooSmall,
    NumberTooLarge,
    StringTooShort,
    StringTooLong,
    StringFormatInvalid,
    /// The value is not one of the allowed values
    EnumInvalid,
}

impl IssueCode {
    /// Returns the wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::FieldUnknown => "field_unknown",
            Self::ValueInvalid => "value_invalid",
            Self::NumberTooSmall => "number_too_small",
            Self::NumberTooLarge => "number_too_large",
            Self::StringTooShort => "string_too_short",
            Self::StringTooLong => "string_too_long",
            Self::StringFormatInvalid => "string_format_invalid",
            Self::EnumInvalid => "enum_invalid",
        }
    }

    /// English detail used when no constraint-specific wording applies.
    pub fn default_detail(&self) -> &'static str {
        match self {
            Self::Required => "is required",
            Self::FieldUnknown => "is not a known field",
            Self::ValueInvalid => "is invalid",
            Self::NumberTooSmall => "is too small",
            Self::NumberTooLarge => "is too large",
            Self::StringTooShort => "is too short",
            Self::StringTooLong => "is too long",
            Self::StringFormatInvalid => "has an invalid format",
            Self::EnumInvalid => "is not an allowed value",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Paths and pointers
// =============================================================================

/// One step of an issue path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<PathSegment> for String {
    fn from(segment: PathSegment) -> Self {
        segment.to_string()
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Escape one reference token per RFC 6901 (`~` to `~0`, `/` to `~1`).
pub fn escape_token(token: &str) -> Cow<'_, str> {
    if token.contains(['~', '/']) {
        Cow::Owned(token.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(token)
    }
}

/// Undo [`escape_token`]. `~1` is decoded before `~0`.
pub fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Build the JSON Pointer addressing `path`. The empty path is the root, `""`.
pub fn pointer(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        out.push('/');
        match segment {
            PathSegment::Key(key) => out.push_str(&escape_token(key)),
            PathSegment::Index(index) => out.push_str(&index.to_string()),
        }
    }
    out
}

/// Split a JSON Pointer into unescaped reference tokens.
pub fn parse_pointer(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer
        .strip_prefix('/')
        .unwrap_or(pointer)
        .split('/')
        .map(unescape_token)
        .collect()
}

/// Render a bound as an integer when it has no fractional part.
pub(crate) fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

// =============================================================================
// Issue
// =============================================================================

/// One validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub code: IssueCode,
    /// Human-readable detail
    pub detail: String,
    /// Ordered field/index segments from the payload root
    pub path: Vec<PathSegment>,
    /// RFC 6901 pointer derived from `path`
    pub pointer: String,
    /// Constraint metadata, e.g. `{"minimum": 1}`
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl Issue {
    /// Create an issue with the default detail for `code`.
    pub fn new(code: IssueCode, path: Vec<PathSegment>) -> Self {
        Self {
            code,
            detail: code.default_detail().to_string(),
            pointer: pointer(&path),
            path,
            meta: Map::new(),
        }
    }

    /// Replace the detail string.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Add one metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn required(path: Vec<PathSegment>) -> Self {
        Self::new(IssueCode::Required, path)
    }

    pub fn unknown_field(path: Vec<PathSegment>) -> Self {
        Self::new(IssueCode::FieldUnknown, path)
    }

    /// Wrong type; `expected` names the declared kind.
    pub fn invalid(path: Vec<PathSegment>, expected: &str) -> Self {
        Self::new(IssueCode::ValueInvalid, path)
            .with_detail(format!("must be a valid {expected}"))
            .with_meta("expected", expected)
    }

    pub fn number_too_small(path: Vec<PathSegment>, minimum: f64) -> Self {
        let minimum = number_value(minimum);
        Self::new(IssueCode::NumberTooSmall, path)
            .with_detail(format!("must be greater than or equal to {minimum}"))
            .with_meta("minimum", minimum)
    }

    pub fn number_too_large(path: Vec<PathSegment>, maximum: f64) -> Self {
        let maximum = number_value(maximum);
        Self::new(IssueCode::NumberTooLarge, path)
            .with_detail(format!("must be less than or equal to {maximum}"))
            .with_meta("maximum", maximum)
    }

    pub fn string_too_short(path: Vec<PathSegment>, minimum: f64) -> Self {
        let minimum = number_value(minimum);
        Self::new(IssueCode::StringTooShort, path)
            .with_detail(format!("must be at least {minimum} characters"))
            .with_meta("minimum", minimum)
    }

    pub fn string_too_long(path: Vec<PathSegment>, maximum: f64) -> Self {
        let maximum = number_value(maximum);
        Self::new(IssueCode::StringTooLong, path)
            .with_detail(format!("must be at most {maximum} characters"))
            .with_meta("maximum", maximum)
    }

    pub fn format_invalid(path: Vec<PathSegment>, format: &str) -> Self {
        Self::new(IssueCode::StringFormatInvalid, path)
            .with_detail(format!("must be a valid {format}"))
            .with_meta("format", format)
    }

    pub fn enum_invalid(path: Vec<PathSegment>, allowed: &[String]) -> Self {
        Self::new(IssueCode::EnumInvalid, path)
            .with_detail(format!("must be one of: {}", allowed.join(", ")))
            .with_meta("allowed", allowed.to_vec())
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pointer.is_empty() {
            write!(f, "[{}] value {}", self.code, self.detail)
        } else {
            write!(f, "[{}] {} {}", self.code, self.pointer, self.detail)
        }
    }
}

// =============================================================================
// Issue collection
// =============================================================================

/// Issues aggregated for one request.
///
/// Serialized under the canonical top-level key `issues`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueCollection {
    pub issues: Vec<Issue>,
}

impl IssueCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.issues.iter()
    }

    /// Group issues by pointer for form-field lookup.
    pub fn by_pointer(&self) -> BTreeMap<&str, Vec<&Issue>> {
        let mut map: BTreeMap<&str, Vec<&Issue>> = BTreeMap::new();
        for issue in &self.issues {
            map.entry(issue.pointer.as_str()).or_default().push(issue);
        }
        map
    }

    /// Convert persistence-layer errors, translating attribute paths through `key_case`.
    pub fn from_record_errors(errors: &[RecordError], key_case: KeyCase) -> Self {
        errors.iter().map(|e| e.to_issue(key_case)).collect()
    }

    pub fn into_vec(self) -> Vec<Issue> {
        self.issues
    }
}

impl From<Vec<Issue>> for IssueCollection {
    fn from(issues: Vec<Issue>) -> Self {
        Self { issues }
    }
}

impl FromIterator<Issue> for IssueCollection {
    fn from_iter<T: IntoIterator<Item = Issue>>(iter: T) -> Self {
        Self {
            issues: iter.into_iter().collect(),
        }
    }
}

impl Extend<Issue> for IssueCollection {
    fn extend<T: IntoIterator<Item = Issue>>(&mut self, iter: T) {
        self.issues.extend(iter);
    }
}

impl IntoIterator for IssueCollection {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

impl<'a> IntoIterator for &'a IssueCollection {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

impl fmt::Display for IssueCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        write!(f, "{} issue(s): {}", self.issues.len(), rendered.join("; "))
    }
}

// =============================================================================
// Persistence error conversion
// =============================================================================

/// A validation error reported by the persistence layer for one attribute.
///
/// `attribute` may be dotted to address nested records (`line_items.0.name`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordError {
    pub attribute: String,
    /// Error type such as `blank`, `taken` or `too_short`
    pub error: String,
    /// Options reported with the error, e.g. `{"count": 3}`
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecordError {
    pub fn new(attribute: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            error: error.into(),
            options: Map::new(),
            message: None,
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn count(&self) -> Option<f64> {
        self.options.get("count").and_then(Value::as_f64)
    }

    /// Convert into an issue whose path segments use the wire key case.
    pub fn to_issue(&self, key_case: KeyCase) -> Issue {
        let path: Vec<PathSegment> = self
            .attribute
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|segment| match segment.parse::<usize>() {
                Ok(index) => PathSegment::Index(index),
                Err(_) => PathSegment::Key(key_case.apply(segment)),
            })
            .collect();

        let issue = match (self.error.as_str(), self.count()) {
            ("blank", _) | ("required", _) => Issue::required(path),
            ("too_short", Some(n)) => Issue::string_too_short(path, n),
            ("too_long", Some(n)) => Issue::string_too_long(path, n),
            ("greater_than_or_equal_to", Some(n)) => Issue::number_too_small(path, n),
            ("less_than_or_equal_to", Some(n)) => Issue::number_too_large(path, n),
            ("inclusion", _) => Issue::new(IssueCode::EnumInvalid, path),
            ("taken", _) => Issue::new(IssueCode::ValueInvalid, path)
                .with_detail("has already been taken")
                .with_meta("reason", "taken"),
            _ => Issue::new(IssueCode::ValueInvalid, path),
        };

        match &self.message {
            Some(message) => issue.with_detail(message.clone()),
            None => issue,
        }
    }
}
