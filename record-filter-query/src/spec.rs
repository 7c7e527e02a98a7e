//! The compiled form of a filter handed to the executor.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::sql::escape_identifier;
use crate::value::FilterValue;

/// A compiled filter: condition, binds, joins and structural clauses.
///
/// `bind_values` holds exactly one value per placeholder in `condition`, in
/// the order the placeholders appear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// The WHERE condition, absent when the filter has no conditions.
    pub condition: Option<String>,
    /// Values for the placeholders in `condition`.
    pub bind_values: Vec<FilterValue>,
    /// Join clauses, deduplicated, in first-occurrence order.
    pub joins: Vec<String>,
    /// Maximum number of records.
    pub limit: Option<u64>,
    /// Number of records to skip.
    pub offset: Option<u64>,
    /// ORDER BY body, e.g. `posts.permalink ASC, posts.id DESC`.
    pub order: Option<String>,
    /// GROUP BY body.
    pub group_by: Option<String>,
    /// Columns to select, if restricted.
    pub select_columns: Option<Vec<SmolStr>>,
    /// Whether to select distinct rows.
    pub distinct: bool,
}

impl QuerySpec {
    /// Check if the spec restricts nothing at all.
    pub fn is_unrestricted(&self) -> bool {
        self.condition.is_none()
            && self.joins.is_empty()
            && self.limit.is_none()
            && self.offset.is_none()
            && self.group_by.is_none()
    }

    /// Render the whole SELECT statement against `table`.
    pub fn to_select_sql(&self, table: &str) -> String {
        let table = escape_identifier(table);
        let mut sql = String::from("SELECT ");

        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        match &self.select_columns {
            Some(cols) if !cols.is_empty() => {
                let cols: Vec<&str> = cols.iter().map(SmolStr::as_str).collect();
                sql.push_str(&cols.join(", "));
            }
            _ => {
                sql.push_str(&table);
                sql.push_str(".*");
            }
        }

        sql.push_str(" FROM ");
        sql.push_str(&table);

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        if let Some(ref condition) = self.condition {
            sql.push_str(" WHERE ");
            sql.push_str(condition);
        }

        if let Some(ref group_by) = self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }

        if let Some(ref order) = self.order {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unrestricted_select() {
        let spec = QuerySpec::default();
        assert!(spec.is_unrestricted());
        assert_eq!(spec.to_select_sql("posts"), r#"SELECT "posts".* FROM "posts""#);
    }

    #[test]
    fn test_full_select() {
        let spec = QuerySpec {
            condition: Some(r#""photos".format = ?"#.to_string()),
            bind_values: vec!["jpg".into()],
            joins: vec![r#"INNER JOIN "photos" ON "photos".id = "posts".photo_id"#.to_string()],
            limit: Some(10),
            offset: Some(20),
            order: Some("photos.path DESC, posts.permalink ASC".to_string()),
            group_by: None,
            select_columns: Some(vec!["posts.id".into(), "posts.permalink".into()]),
            distinct: true,
        };
        assert!(!spec.is_unrestricted());
        assert_eq!(
            spec.to_select_sql("posts"),
            concat!(
                r#"SELECT DISTINCT posts.id, posts.permalink FROM "posts" "#,
                r#"INNER JOIN "photos" ON "photos".id = "posts".photo_id "#,
                r#"WHERE "photos".format = ? "#,
                "ORDER BY photos.path DESC, posts.permalink ASC LIMIT 10 OFFSET 20"
            )
        );
    }

    #[test]
    fn test_serializes_for_executors() {
        let spec = QuerySpec {
            condition: Some("posts.id IN (?)".to_string()),
            bind_values: vec![vec![1, 2].into()],
            ..Default::default()
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["bind_values"], serde_json::json!([[1, 2]]));
        assert_eq!(json["distinct"], serde_json::json!(false));
    }
}
