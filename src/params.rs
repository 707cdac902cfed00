//! Captured path variables
//!
//! A successful match produces a [`Variables`] value: a map from variable name
//! (or the wildcard token) to every value captured under that name, in the
//! order the segments were traversed. The same name bound at two nesting
//! levels yields two values.

use std::collections::HashMap;

/// Ordered multi-valued variables captured from a request path
///
/// # Example
///
/// ```
/// use route_mux::Variables;
///
/// let mut vars = Variables::new();
/// vars.push("name", "john");
/// vars.push("name", "jane");
/// vars.push("age", "20");
///
/// assert_eq!(vars.get("name"), "john");
/// assert_eq!(vars.get_all("name"), ["john", "jane"]);
/// assert_eq!(vars.get_int("age"), 20);
/// assert_eq!(vars.get_int("missing"), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    values: HashMap<String, Vec<String>>,
}

impl Variables {
    /// Create an empty set of variables
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a map of name to values
    pub fn from_map(values: HashMap<String, Vec<String>>) -> Self {
        Self { values }
    }

    /// First value captured under `key`, or `""` when there is none
    pub fn get(&self, key: &str) -> &str {
        self.values
            .get(key)
            .and_then(|values| values.first())
            .map_or("", |value| value.as_str())
    }

    /// Every value captured under `key`, in traversal order
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// First value under `key` parsed as an integer, zero on absence or parse failure
    pub fn get_int(&self, key: &str) -> i64 {
        self.get(key).parse().unwrap_or(0)
    }

    /// First value under `key` parsed as `T`
    ///
    /// Returns `None` if the variable doesn't exist or cannot be parsed.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.values.get(key)?.first()?.parse().ok()
    }

    /// Append a value under `key`
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Append several values under `key`
    pub fn extend<I, S>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values
            .entry(key.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    /// Copy every entry of `other` into `self`, replacing entries with the same name
    pub fn merge(&mut self, other: Variables) {
        self.values.extend(other.values);
    }

    /// Check if a variable was captured
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over all names and their values
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.values.iter()
    }

    /// Check if nothing was captured
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Consume into the underlying map
    pub fn into_map(self) -> HashMap<String, Vec<String>> {
        self.values
    }
}

impl<K, V> FromIterator<(K, V)> for Variables
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = Variables::new();
        for (key, value) in iter {
            vars.push(key, value);
        }
        vars
    }
}

// ============================================================================
// Tests
// ============================================================================
