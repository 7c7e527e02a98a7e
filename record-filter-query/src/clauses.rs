//! Structural clauses: limit, offset, order, group, select and distinct.
//!
//! Only the outermost scope of a filter owns a clause set. Repeated calls
//! follow per-clause rules:
//!
//! | clause | rule |
//! |--------|------|
//! | limit, offset | last write wins |
//! | order, group_by | append in call order |
//! | select | each call overwrites |
//! | distinct | once set, stays set |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::column::ColumnRef;
use crate::error::{FilterError, FilterResult};

/// Sort order for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortOrder {
    /// Get the SQL keyword for this sort order.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

impl FromStr for SortOrder {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(FilterError::invalid_direction(s)),
        }
    }
}

/// Anything that can name an order direction.
///
/// [`SortOrder`] always succeeds; strings must be `asc` or `desc`.
pub trait IntoDirection {
    /// Resolve the direction.
    fn into_direction(self) -> FilterResult<SortOrder>;
}

impl IntoDirection for SortOrder {
    fn into_direction(self) -> FilterResult<SortOrder> {
        Ok(self)
    }
}

impl IntoDirection for &str {
    fn into_direction(self) -> FilterResult<SortOrder> {
        self.parse()
    }
}

impl IntoDirection for String {
    fn into_direction(self) -> FilterResult<SortOrder> {
        self.parse()
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    /// The column or path to order by.
    pub column: ColumnRef,
    /// The direction.
    pub direction: SortOrder,
}

/// Clauses declared at the outermost scope of a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralClauses {
    /// Maximum number of records.
    pub limit: Option<u64>,
    /// Number of records to skip.
    pub offset: Option<u64>,
    /// Order entries in call order.
    pub order: Vec<OrderEntry>,
    /// Group entries in call order.
    pub group_by: Vec<ColumnRef>,
    /// Columns to select, if restricted.
    pub select_columns: Option<Vec<SmolStr>>,
    /// Whether the query selects distinct rows.
    pub distinct: bool,
}

impl StructuralClauses {
    /// Create an empty clause set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if no clause has been declared.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Set the limit (last write wins).
    pub fn set_limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    /// Set the offset (last write wins).
    pub fn set_offset(&mut self, offset: u64) {
        self.offset = Some(offset);
    }

    /// Append an order entry.
    pub fn add_order(&mut self, column: ColumnRef, direction: SortOrder) {
        self.order.push(OrderEntry { column, direction });
    }

    /// Append a group entry.
    pub fn add_group_by(&mut self, column: ColumnRef) {
        self.group_by.push(column);
    }

    /// Replace the selected columns.
    pub fn set_select_columns(&mut self, columns: Vec<SmolStr>) {
        self.select_columns = Some(columns);
    }

    /// Mark the query distinct.
    pub fn set_distinct(&mut self) {
        self.distinct = true;
    }
}
