//! SQL generation utilities shared by the compiler.

use serde::{Deserialize, Serialize};

use crate::value::FilterValue;

/// Escape a string for use in SQL (for identifiers, not values).
pub fn escape_identifier(name: &str) -> String {
    let escaped = name.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

/// Placeholder syntax used for bind values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaceholderStyle {
    /// `?` for every parameter (SQLite, MySQL).
    #[default]
    Question,
    /// `$1`, `$2`, ... (PostgreSQL).
    Dollar,
}

impl PlaceholderStyle {
    /// Get the placeholder for the parameter at the 1-based `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::Question => "?".to_string(),
            Self::Dollar => format!("${}", index),
        }
    }
}

/// Collects bind values in placeholder order.
#[derive(Debug, Clone, Default)]
pub struct Binder {
    style: PlaceholderStyle,
    values: Vec<FilterValue>,
}

impl Binder {
    /// Create a binder for the given placeholder style.
    pub fn new(style: PlaceholderStyle) -> Self {
        Self {
            style,
            values: Vec::new(),
        }
    }

    /// Record a value and return its placeholder.
    pub fn bind(&mut self, value: FilterValue) -> String {
        self.values.push(value);
        self.style.placeholder(self.values.len())
    }

    /// Splice a hand-written condition that uses `?` placeholders, rewriting
    /// them for the configured style. `?` inside quoted literals is left alone.
    pub fn splice(&mut self, condition: &str, values: &[FilterValue]) -> String {
        if self.style == PlaceholderStyle::Question {
            self.values.extend_from_slice(values);
            return condition.to_string();
        }

        let mut out = String::with_capacity(condition.len() + values.len() * 2);
        let mut pending = values.iter();
        let mut in_literal = false;
        for ch in condition.chars() {
            match ch {
                '\'' => {
                    in_literal = !in_literal;
                    out.push(ch);
                }
                '?' if !in_literal => match pending.next() {
                    Some(value) => out.push_str(&self.bind(value.clone())),
                    None => out.push(ch),
                },
                _ => out.push(ch),
            }
        }
        self.values.extend(pending.cloned());
        out
    }

    /// Number of values bound so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if nothing has been bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume the binder, yielding the values in order.
    pub fn into_values(self) -> Vec<FilterValue> {
        self.values
    }
}

/// Check if `name` is a bare identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Qualify a column for use in a condition, e.g. `"posts".permalink`.
///
/// Columns that already contain a `.` are treated as qualified by the author.
pub fn qualify_condition_column(table: &str, column: &str, quote_table: bool) -> String {
    if column.contains('.') {
        return column.to_string();
    }
    if quote_table {
        format!("{}.{}", escape_identifier(table), column)
    } else {
        format!("{}.{}", table, column)
    }
}

/// Qualify a column for use in ORDER BY / GROUP BY, e.g. `posts.permalink`.
pub fn qualify_clause_column(table: &str, column: &str) -> String {
    if column.contains('.') {
        return column.to_string();
    }
    format!("{}.{}", table, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("posts"), "\"posts\"");
        assert_eq!(escape_identifier("has\"quote"), "\"has\"\"quote\"");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(PlaceholderStyle::Question.placeholder(3), "?");
        assert_eq!(PlaceholderStyle::Dollar.placeholder(3), "$3");
    }

    #[test]
    fn test_binder_numbers_in_order() {
        let mut binder = Binder::new(PlaceholderStyle::Dollar);
        assert_eq!(binder.bind(1.into()), "$1");
        assert_eq!(binder.bind("a".into()), "$2");
        assert_eq!(binder.into_values(), vec![FilterValue::Int(1), FilterValue::from("a")]);
    }

    #[test]
    fn test_splice_renumbers_outside_literals() {
        let mut binder = Binder::new(PlaceholderStyle::Dollar);
        binder.bind(0.into());
        let sql = binder.splice("a = ? AND b = '?' AND c = ?", &[1.into(), 2.into()]);
        assert_eq!(sql, "a = $2 AND b = '?' AND c = $3");
        assert_eq!(binder.len(), 3);
    }

    #[test]
    fn test_splice_question_is_verbatim() {
        let mut binder = Binder::default();
        let sql = binder.splice("blog_id = ?", &[3.into()]);
        assert_eq!(sql, "blog_id = ?");
        assert_eq!(binder.into_values(), vec![FilterValue::Int(3)]);
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify_condition_column("posts", "permalink", true), "\"posts\".permalink");
        assert_eq!(qualify_condition_column("posts", "permalink", false), "posts.permalink");
        assert_eq!(qualify_condition_column("posts", "p.id", true), "p.id");
        assert_eq!(qualify_clause_column("photos", "path"), "photos.path");
    }

    #[test]
    fn test_plain_identifiers() {
        assert!(is_plain_identifier("permalink"));
        assert!(is_plain_identifier("_rank2"));
        assert!(!is_plain_identifier("RANDOM()"));
        assert!(!is_plain_identifier("COUNT(*) DESC"));
        assert!(!is_plain_identifier("posts.id"));
        assert!(!is_plain_identifier("2nd"));
        assert!(!is_plain_identifier(""));
    }
}
