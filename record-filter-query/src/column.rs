//! Column references used by ORDER BY and GROUP BY clauses.

use smol_str::SmolStr;

/// A column named in an order or group clause.
///
/// ```rust
/// use record_filter_query::ColumnRef;
///
/// // A column on the filtered type
/// let col = ColumnRef::from("permalink");
///
/// // A column reached through the `photo` association
/// let col = ColumnRef::path(["photo", "path"]);
///
/// // Hand-written SQL, passed through verbatim
/// let col = ColumnRef::literal("LENGTH(posts.permalink)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnRef {
    /// A bare name, resolved against the filtered type.
    ///
    /// If the type declares its columns and this name is not one of them,
    /// the name is emitted verbatim.
    Name(SmolStr),
    /// Association names followed by the column on the last target.
    Path(Vec<SmolStr>, SmolStr),
    /// An expression emitted verbatim.
    Literal(String),
}

impl ColumnRef {
    /// Build a path from association names ending in a column.
    ///
    /// A single-element path is the same as a bare name. An empty path names
    /// no column and is rejected by the order and group clauses.
    pub fn path<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut segments: Vec<SmolStr> = segments
            .into_iter()
            .map(|s| SmolStr::new(s.as_ref()))
            .collect();
        match segments.pop() {
            Some(column) if segments.is_empty() => Self::Name(column),
            Some(column) => Self::Path(segments, column),
            None => Self::Name(SmolStr::default()),
        }
    }

    /// An expression emitted without qualification.
    pub fn literal(sql: impl Into<String>) -> Self {
        Self::Literal(sql.into())
    }

    /// Check if the reference names no column.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Name(name) => name.trim().is_empty(),
            Self::Path(_, column) => column.trim().is_empty(),
            Self::Literal(sql) => sql.trim().is_empty(),
        }
    }

    /// Human readable form used in logs and errors.
    pub fn describe(&self) -> String {
        match self {
            Self::Name(name) => name.to_string(),
            Self::Path(relations, column) => {
                let mut parts: Vec<&str> = relations.iter().map(SmolStr::as_str).collect();
                parts.push(column);
                parts.join(" => ")
            }
            Self::Literal(sql) => sql.clone(),
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        Self::Name(SmolStr::new(name))
    }
}

impl From<String> for ColumnRef {
    fn from(name: String) -> Self {
        Self::Name(SmolStr::from(name))
    }
}

impl From<SmolStr> for ColumnRef {
    fn from(name: SmolStr) -> Self {
        Self::Name(name)
    }
}

impl<const N: usize> From<[&str; N]> for ColumnRef {
    fn from(segments: [&str; N]) -> Self {
        Self::path(segments)
    }
}
