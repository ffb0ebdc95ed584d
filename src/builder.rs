use regex::{Captures, Regex};
use std::collections::HashMap;

/// Pattern for named placeholders: `?` followed by one or more ASCII word characters.
const NAMED_PLACEHOLDER: &str = r"[?]([a-zA-Z0-9_]+)";

/// Positional marker syntax expected by the underlying driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PlaceholderStyle {
    /// `?` for every parameter (MySQL, SQLite).
    #[default]
    Question,
    /// `$1`, `$2`, ... numbered by marker position (PostgreSQL).
    Dollar,
}

impl PlaceholderStyle {
    /// Guesses the marker style from a connection URL.
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            PlaceholderStyle::Dollar
        } else {
            PlaceholderStyle::Question
        }
    }

    fn marker(self, ordinal: usize) -> String {
        match self {
            PlaceholderStyle::Question => "?".to_owned(),
            PlaceholderStyle::Dollar => format!("${}", ordinal + 1),
        }
    }
}

/// Placeholder names of a rewritten template, by marker position.
///
/// `positions` keeps the name bound at every marker, repeats included, and is what the binder
/// walks. `get` answers with the ordinal of a name's *last* occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    positions: Vec<String>,
    ordinals: HashMap<String, usize>,
}

impl NameTable {
    fn push(&mut self, name: &str) -> usize {
        let ordinal = self.positions.len();
        self.positions.push(name.to_owned());
        self.ordinals.insert(name.to_owned(), ordinal);
        ordinal
    }

    /// Number of positional markers in the rewritten template.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Ordinal of the last marker bound to `name`.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.ordinals.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ordinals.contains_key(name)
    }

    /// Placeholder name at each marker, in template order.
    pub fn positions(&self) -> impl Iterator<Item = &str> {
        self.positions.iter().map(String::as_str)
    }

    /// Distinct names with the ordinal of their last occurrence, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.ordinals.iter().map(|(name, &ordinal)| (name.as_str(), ordinal))
    }
}

/// A template rewritten to positional markers together with its name table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltQuery {
    pub sql: String,
    pub names: NameTable,
}

/// Converts named placeholders (`?name`) to the driver's positional markers.
///
/// This function is used internally by [`Db`](crate::Db), [`Tx`](crate::Tx) and
/// [`Statement`](crate::Statement).
///
/// # Examples
///
/// ```
/// use sqlx_named::builder::{build_query, PlaceholderStyle};
///
/// let built = build_query(
///     "SELECT * FROM users WHERE id = ?id AND name = ?name",
///     PlaceholderStyle::Question,
/// )?;
/// assert_eq!(built.sql, "SELECT * FROM users WHERE id = ? AND name = ?");
/// assert_eq!(built.names.get("name"), Some(1));
/// # Ok::<(), sqlx_named::Error>(())
/// ```
pub fn build_query(template: &str, style: PlaceholderStyle) -> crate::Result<BuiltQuery> {
    let regex = Regex::new(NAMED_PLACEHOLDER)?;
    let mut names = NameTable::default();
    let sql = regex
        .replace_all(template, |caps: &Captures<'_>| {
            let ordinal = names.push(&caps[1]);
            style.marker(ordinal)
        })
        .into_owned();
    Ok(BuiltQuery { sql, names })
}
