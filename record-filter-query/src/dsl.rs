//! The filter DSL.
//!
//! A [`Scope`] is the builder an author writes against. The outermost scope of
//! a filter owns the structural clauses; scopes opened by `having`, `all_of`
//! and friends only accept conditions.
//!
//! ```rust
//! use record_filter_query::Scope;
//!
//! let mut q = Scope::root();
//! q.with("permalink").equal_to("blog-post");
//! q.any_of(|g| {
//!     g.with("blog_id").equal_to(1);
//!     g.with("blog_id").is_null();
//!     Ok(())
//! })?;
//! q.having("photo", |p| {
//!     p.with("format").equal_to("jpg");
//!     Ok(())
//! })?;
//! q.order("permalink")?.limit(10, None)?;
//! # Ok::<(), record_filter_query::FilterError>(())
//! ```

use smol_str::SmolStr;

use crate::clauses::{IntoDirection, StructuralClauses};
use crate::column::ColumnRef;
use crate::error::{FilterError, FilterResult};
use crate::join::JoinKind;
use crate::restriction::Restriction;
use crate::tree::{Combinator, Group, JoinScope};
use crate::value::FilterValue;

/// Where a scope sits in the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// The outermost scope of a filter.
    Root,
    /// The body of a `having` block.
    Join,
    /// The body of an `all_of`/`any_of` block.
    Group,
}

impl ScopeKind {
    fn describe(&self) -> &'static str {
        match self {
            Self::Root => "the top-level filter",
            Self::Join => "a having block",
            Self::Group => "an all_of/any_of block",
        }
    }
}

/// A DSL scope collecting conditions and, at the root, structural clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    kind: ScopeKind,
    group: Group,
    clauses: StructuralClauses,
}

impl Scope {
    /// Create the outermost scope of a filter.
    pub fn root() -> Self {
        Self::nested(ScopeKind::Root, Group::all())
    }

    fn nested(kind: ScopeKind, group: Group) -> Self {
        Self {
            kind,
            group,
            clauses: StructuralClauses::new(),
        }
    }

    /// Where this scope sits.
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// The conditions collected so far.
    pub fn group(&self) -> &Group {
        &self.group
    }

    /// The structural clauses collected so far.
    pub fn clauses(&self) -> &StructuralClauses {
        &self.clauses
    }

    /// Check if nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.group.is_empty() && self.clauses.is_empty()
    }

    // ============== Restrictions ==============

    /// Start a restriction on `column`.
    pub fn with(&mut self, column: impl AsRef<str>) -> &mut Restriction {
        self.group.add_restriction(Restriction::new(column, false))
    }

    /// Start a negated restriction on `column`.
    pub fn without(&mut self, column: impl AsRef<str>) -> &mut Restriction {
        self.group.add_restriction(Restriction::new(column, true))
    }

    /// `column = value`, or `column IS NULL` for a null value.
    pub fn with_value(
        &mut self,
        column: impl AsRef<str>,
        value: impl Into<FilterValue>,
    ) -> &mut Self {
        self.with(column).equal_to_or_null(value.into());
        self
    }

    /// Negated [`with_value`](Self::with_value).
    pub fn without_value(
        &mut self,
        column: impl AsRef<str>,
        value: impl Into<FilterValue>,
    ) -> &mut Self {
        self.without(column).equal_to_or_null(value.into());
        self
    }

    // ============== Groups ==============

    /// Conditions in `f` must all hold.
    pub fn all_of<F>(&mut self, f: F) -> FilterResult<&mut Self>
    where
        F: FnOnce(&mut Scope) -> FilterResult<()>,
    {
        self.group_with(Combinator::All, false, f)
    }

    /// At least one condition in `f` must hold.
    pub fn any_of<F>(&mut self, f: F) -> FilterResult<&mut Self>
    where
        F: FnOnce(&mut Scope) -> FilterResult<()>,
    {
        self.group_with(Combinator::Any, false, f)
    }

    /// No condition in `f` may hold.
    pub fn none_of<F>(&mut self, f: F) -> FilterResult<&mut Self>
    where
        F: FnOnce(&mut Scope) -> FilterResult<()>,
    {
        self.group_with(Combinator::Any, true, f)
    }

    /// Conditions in `f` must not all hold.
    pub fn not_all_of<F>(&mut self, f: F) -> FilterResult<&mut Self>
    where
        F: FnOnce(&mut Scope) -> FilterResult<()>,
    {
        self.group_with(Combinator::All, true, f)
    }

    fn group_with<F>(
        &mut self,
        combinator: Combinator,
        negated: bool,
        f: F,
    ) -> FilterResult<&mut Self>
    where
        F: FnOnce(&mut Scope) -> FilterResult<()>,
    {
        let mut inner = Self::nested(ScopeKind::Group, Group::new(combinator, negated));
        f(&mut inner)?;
        match combinator {
            Combinator::All => self.group.add_all_of(inner.group),
            Combinator::Any => self.group.add_any_of(inner.group),
        }
        Ok(self)
    }

    // ============== Joins ==============

    /// Conditions in `f` apply to the `relation` association (inner join).
    pub fn having<F>(&mut self, relation: impl AsRef<str>, f: F) -> FilterResult<&mut Self>
    where
        F: FnOnce(&mut Scope) -> FilterResult<()>,
    {
        self.join_with(relation, JoinKind::Inner, f)
    }

    /// Like [`having`](Self::having) with a left outer join.
    pub fn having_left<F>(&mut self, relation: impl AsRef<str>, f: F) -> FilterResult<&mut Self>
    where
        F: FnOnce(&mut Scope) -> FilterResult<()>,
    {
        self.join_with(relation, JoinKind::Left, f)
    }

    fn join_with<F>(
        &mut self,
        relation: impl AsRef<str>,
        kind: JoinKind,
        f: F,
    ) -> FilterResult<&mut Self>
    where
        F: FnOnce(&mut Scope) -> FilterResult<()>,
    {
        let mut inner = Self::nested(ScopeKind::Join, Group::all());
        f(&mut inner)?;
        self.group.add_join(JoinScope::new(relation, kind, inner.group));
        Ok(self)
    }

    // ============== Structural Clauses ==============

    fn structural(&mut self, operation: &str) -> FilterResult<&mut StructuralClauses> {
        match self.kind {
            ScopeKind::Root => Ok(&mut self.clauses),
            nested => Err(FilterError::no_such_operation(operation, nested.describe())),
        }
    }

    /// `limit(n, None)` limits to `n` rows; `limit(offset, Some(n))` also
    /// skips `offset` rows.
    pub fn limit(&mut self, first: u64, second: Option<u64>) -> FilterResult<&mut Self> {
        let clauses = self.structural("limit")?;
        match second {
            Some(limit) => {
                clauses.set_offset(first);
                clauses.set_limit(limit);
            }
            None => clauses.set_limit(first),
        }
        Ok(self)
    }

    /// Skip `n` rows.
    pub fn offset(&mut self, n: u64) -> FilterResult<&mut Self> {
        self.structural("offset")?.set_offset(n);
        Ok(self)
    }

    /// Order ascending by a column or path.
    pub fn order(&mut self, column: impl Into<ColumnRef>) -> FilterResult<&mut Self> {
        let clauses = self.structural("order")?;
        clauses.add_order(clause_column("order", column.into())?, Default::default());
        Ok(self)
    }

    /// Order by a column or path in the given direction.
    pub fn order_by(
        &mut self,
        column: impl Into<ColumnRef>,
        direction: impl IntoDirection,
    ) -> FilterResult<&mut Self> {
        let clauses = self.structural("order")?;
        let column = clause_column("order", column.into())?;
        clauses.add_order(column, direction.into_direction()?);
        Ok(self)
    }

    /// Group by a column or path.
    pub fn group_by(&mut self, column: impl Into<ColumnRef>) -> FilterResult<&mut Self> {
        let clauses = self.structural("group_by")?;
        clauses.add_group_by(clause_column("group_by", column.into())?);
        Ok(self)
    }

    /// Select distinct rows, restricted to `columns` when any are given.
    pub fn distinct<I, S>(&mut self, columns: I) -> FilterResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let clauses = self.structural("distinct")?;
        clauses.set_distinct();
        let columns = collect_columns(columns);
        if !columns.is_empty() {
            clauses.set_select_columns(columns);
        }
        Ok(self)
    }

    /// Restrict the selected columns.
    pub fn select<I, S>(&mut self, columns: I) -> FilterResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.structural("select")?
            .set_select_columns(collect_columns(columns));
        Ok(self)
    }
}

fn clause_column(operation: &str, column: ColumnRef) -> FilterResult<ColumnRef> {
    if column.is_empty() {
        return Err(FilterError::empty_column(operation));
    }
    Ok(column)
}

fn collect_columns<I, S>(columns: I) -> Vec<SmolStr>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    columns.into_iter().map(|c| SmolStr::new(c.as_ref())).collect()
}
