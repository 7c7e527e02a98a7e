//! Associations between record types and the join clauses they produce.

use convert_case::{Case, Casing};
use smol_str::SmolStr;

use crate::schema::ModelId;
use crate::sql::escape_identifier;

/// Join flavour requested by a `having` scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinKind {
    /// `INNER JOIN`
    #[default]
    Inner,
    /// `LEFT OUTER JOIN`
    Left,
}

impl JoinKind {
    /// The SQL keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT OUTER JOIN",
        }
    }
}

/// Type of association between record types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    /// The owner holds the foreign key (Post belongs to Photo).
    BelongsTo,
    /// The target holds the foreign key, at most one row (Post has one Summary).
    HasOne,
    /// The target holds the foreign key (Blog has many Posts).
    HasMany,
    /// Rows are linked through a join table (Post has many Tags).
    ManyToMany(JoinTable),
}

/// Join table of a many-to-many association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTable {
    /// Name of the join table.
    pub table_name: SmolStr,
    /// Column referencing the owner; defaults to `<owner>_id`.
    pub source_column: Option<SmolStr>,
    /// Column referencing the target; defaults to `<target>_id`.
    pub target_column: Option<SmolStr>,
}

impl JoinTable {
    /// Create a join table spec using default key columns.
    pub fn new(table_name: impl AsRef<str>) -> Self {
        Self {
            table_name: SmolStr::new(table_name.as_ref()),
            source_column: None,
            target_column: None,
        }
    }

    /// Override both key columns.
    pub fn columns(mut self, source: impl AsRef<str>, target: impl AsRef<str>) -> Self {
        self.source_column = Some(SmolStr::new(source.as_ref()));
        self.target_column = Some(SmolStr::new(target.as_ref()));
        self
    }
}

/// A named association from one record type to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Association name used in `having` and order paths.
    pub name: SmolStr,
    /// Type of association.
    pub kind: RelationKind,
    /// The related record type.
    pub target: ModelId,
    /// Foreign key column; defaults follow the usual `<name>_id` convention.
    pub foreign_key: Option<SmolStr>,
    /// Primary key column on the side the foreign key points to.
    pub primary_key: SmolStr,
}

impl Relation {
    fn new(name: impl AsRef<str>, kind: RelationKind, target: ModelId) -> Self {
        Self {
            name: SmolStr::new(name.as_ref()),
            kind,
            target,
            foreign_key: None,
            primary_key: SmolStr::new_static("id"),
        }
    }

    /// The owner holds `<name>_id`.
    pub fn belongs_to(name: impl AsRef<str>, target: ModelId) -> Self {
        Self::new(name, RelationKind::BelongsTo, target)
    }

    /// The target holds `<owner>_id`, at most one row.
    pub fn has_one(name: impl AsRef<str>, target: ModelId) -> Self {
        Self::new(name, RelationKind::HasOne, target)
    }

    /// The target holds `<owner>_id`.
    pub fn has_many(name: impl AsRef<str>, target: ModelId) -> Self {
        Self::new(name, RelationKind::HasMany, target)
    }

    /// Rows linked through `join_table`.
    pub fn many_to_many(name: impl AsRef<str>, target: ModelId, join_table: JoinTable) -> Self {
        Self::new(name, RelationKind::ManyToMany(join_table), target)
    }

    /// Override the foreign key column.
    pub fn foreign_key(mut self, column: impl AsRef<str>) -> Self {
        self.foreign_key = Some(SmolStr::new(column.as_ref()));
        self
    }

    /// Override the primary key column.
    pub fn primary_key(mut self, column: impl AsRef<str>) -> Self {
        self.primary_key = SmolStr::new(column.as_ref());
        self
    }

    /// Generate the join clause from `owner` into `target`.
    ///
    /// An aliased target is declared as `table AS alias` and referenced by
    /// its alias; the join table of a many-to-many association is aliased
    /// along with it.
    pub fn to_join_clause(
        &self,
        owner: &JoinEnd<'_>,
        target: &JoinEnd<'_>,
        kind: JoinKind,
        quote: bool,
    ) -> String {
        let keyword = kind.as_sql();
        let o = table_ref(owner.alias, quote);
        let t = table_ref(target.alias, quote);
        let declared = target.declaration(quote);
        let pk = &self.primary_key;

        match &self.kind {
            RelationKind::BelongsTo => {
                let fk = self.foreign_key_or(|| {
                    format!("{}_id", self.name.as_str().to_case(Case::Snake))
                });
                format!("{keyword} {declared} ON {t}.{pk} = {o}.{fk}")
            }
            RelationKind::HasOne | RelationKind::HasMany => {
                let fk = self.foreign_key_or(|| owner.key_column());
                format!("{keyword} {declared} ON {t}.{fk} = {o}.{pk}")
            }
            RelationKind::ManyToMany(jt) => {
                let (source, target_col) = jt.key_columns(owner, target);
                let (j_declared, j) = if target.is_aliased() {
                    let alias = format!("{}_{}", jt.table_name, target.alias);
                    let j = table_ref(&alias, quote);
                    (format!("{} AS {}", table_ref(&jt.table_name, quote), j), j)
                } else {
                    let j = table_ref(&jt.table_name, quote);
                    (j.clone(), j)
                };
                format!(
                    "{keyword} {j_declared} ON {j}.{source} = {o}.{pk} \
                     {keyword} {declared} ON {t}.{pk} = {j}.{target_col}"
                )
            }
        }
    }

    /// Condition selecting the targets associated with one owner row, with a
    /// single `?` for the owner key (or, for `belongs_to`, the foreign key value).
    pub fn to_association_condition(
        &self,
        owner: &JoinEnd<'_>,
        target: &JoinEnd<'_>,
        quote: bool,
    ) -> String {
        let t = table_ref(target.alias, quote);
        let pk = &self.primary_key;

        match &self.kind {
            RelationKind::BelongsTo => format!("{}.{} = ?", t, pk),
            RelationKind::HasOne | RelationKind::HasMany => {
                let fk = self.foreign_key_or(|| owner.key_column());
                format!("{}.{} = ?", t, fk)
            }
            RelationKind::ManyToMany(jt) => {
                let j = table_ref(&jt.table_name, quote);
                let (source, target_col) = jt.key_columns(owner, target);
                format!("{t}.{pk} IN (SELECT {j}.{target_col} FROM {j} WHERE {j}.{source} = ?)")
            }
        }
    }

    fn foreign_key_or(&self, default: impl FnOnce() -> String) -> String {
        self.foreign_key
            .as_ref()
            .map(SmolStr::to_string)
            .unwrap_or_else(default)
    }
}

impl JoinTable {
    fn key_columns(&self, owner: &JoinEnd<'_>, target: &JoinEnd<'_>) -> (String, String) {
        let source = match &self.source_column {
            Some(column) => column.to_string(),
            None => owner.key_column(),
        };
        let target = match &self.target_column {
            Some(column) => column.to_string(),
            None => target.key_column(),
        };
        (source, target)
    }
}

/// One side of a join: the table, the name it is referenced by, and the
/// record type name behind it.
#[derive(Debug, Clone, Copy)]
pub struct JoinEnd<'a> {
    /// Storage table name.
    pub table: &'a str,
    /// Name the table is referenced by; the table name unless aliased.
    pub alias: &'a str,
    /// Record type name used to derive default key columns.
    pub model: &'a str,
}

impl<'a> JoinEnd<'a> {
    /// A join end referenced by its table name.
    pub const fn new(table: &'a str, model: &'a str) -> Self {
        Self {
            table,
            alias: table,
            model,
        }
    }

    /// Reference the table by `alias`.
    pub fn aliased(self, alias: &'a str) -> Self {
        Self { alias, ..self }
    }

    /// Check if the table is referenced by an alias.
    pub fn is_aliased(&self) -> bool {
        self.alias != self.table
    }

    /// Default foreign key pointing at this side, e.g. `blog_post_id`.
    pub fn key_column(&self) -> String {
        format!("{}_id", self.model.to_case(Case::Snake))
    }

    fn declaration(&self, quote: bool) -> String {
        if self.is_aliased() {
            format!("{} AS {}", table_ref(self.table, quote), table_ref(self.alias, quote))
        } else {
            table_ref(self.table, quote)
        }
    }
}

fn table_ref(table: &str, quote: bool) -> String {
    if quote {
        escape_identifier(table)
    } else {
        table.to_string()
    }
}
