//! Compilation of a filter tree into a [`QuerySpec`].
//!
//! The compiler walks the tree of a built [`Scope`] once, in insertion order:
//!
//! - restrictions render against the table of the innermost join scope,
//!   binding their operands as they go, so bind values always follow
//!   placeholder order
//! - a child group with the same combinator as its parent is spliced into the
//!   parent, as is the body of a join inside an AND group
//! - a group rendering two or more parts wraps each part in parentheses
//! - joins are keyed by association path; the first join along a path wins,
//!   and a table reached again through another path is joined under an alias
//!
//! ```rust
//! use record_filter_query::{Compiler, CompilerConfig, ModelDescriptor, Schema, Scope};
//!
//! let mut schema = Schema::new();
//! let post = schema.register(ModelDescriptor::new("Post", "posts"));
//!
//! let mut q = Scope::root();
//! q.with("permalink").equal_to("blog-post");
//! q.with("blog_id").equal_to(3);
//!
//! let spec = Compiler::new(&schema, CompilerConfig::default()).compile(post, &q)?;
//! assert_eq!(
//!     spec.condition.as_deref(),
//!     Some(r#"("posts".permalink = ?) AND ("posts".blog_id = ?)"#)
//! );
//! # Ok::<(), record_filter_query::FilterError>(())
//! ```

use indexmap::{IndexMap, IndexSet};
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::clauses::StructuralClauses;
use crate::column::ColumnRef;
use crate::config::CompilerConfig;
use crate::dsl::Scope;
use crate::error::FilterResult;
use crate::join::{JoinKind, RelationKind};
use crate::schema::{ModelId, Schema};
use crate::spec::QuerySpec;
use crate::sql::{is_plain_identifier, qualify_clause_column, qualify_condition_column, Binder};
use crate::tree::{Combinator, Group, Node};
use crate::value::FilterValue;

/// A hand-written condition ANDed in front of every filter on a collection.
///
/// The condition uses `?` placeholders, one per bind value.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseCondition {
    /// Condition text.
    pub condition: String,
    /// Values for its placeholders.
    pub bind_values: Vec<FilterValue>,
}

impl BaseCondition {
    /// Create a base condition.
    pub fn new(condition: impl Into<String>, bind_values: Vec<FilterValue>) -> Self {
        Self {
            condition: condition.into(),
            bind_values,
        }
    }
}

/// Compiles built scopes against a schema.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'a> {
    schema: &'a Schema,
    config: CompilerConfig,
}

impl<'a> Compiler<'a> {
    /// Create a compiler.
    pub fn new(schema: &'a Schema, config: CompilerConfig) -> Self {
        Self { schema, config }
    }

    /// Compile a root scope built for `model`.
    pub fn compile(&self, model: ModelId, scope: &Scope) -> FilterResult<QuerySpec> {
        self.compile_with_base(model, scope, None)
    }

    /// Compile a root scope, ANDing `base` in front of its conditions.
    pub fn compile_with_base(
        &self,
        model: ModelId,
        scope: &Scope,
        base: Option<&BaseCondition>,
    ) -> FilterResult<QuerySpec> {
        debug!(
            model = %self.schema.name(model),
            placeholders = ?self.config.placeholders,
            "Compiling filter"
        );

        let mut pass = Pass::new(self.schema, self.config);
        let subject = pass.subject(model);

        let mut parts = Vec::new();
        if let Some(base) = base {
            parts.push(pass.binder.splice(&base.condition, &base.bind_values));
        }
        pass.collect_parts(scope.group(), &subject, &mut parts)?;
        let condition = combine(Combinator::All, parts);

        let spec = pass.finish(&subject, condition, scope.clauses())?;
        trace!(
            condition = ?spec.condition,
            binds = spec.bind_values.len(),
            joins = spec.joins.len(),
            "Compiled filter"
        );
        Ok(spec)
    }
}

/// The record type a column resolves against and the name its table is
/// referenced by in the query.
#[derive(Debug, Clone)]
struct Context {
    model: ModelId,
    alias: SmolStr,
}

/// A join added to the query.
#[derive(Debug)]
struct JoinEntry {
    alias: SmolStr,
    clause: String,
}

/// State of one compilation.
struct Pass<'a> {
    schema: &'a Schema,
    config: CompilerConfig,
    binder: Binder,
    /// Keyed by the owner's alias and the association name.
    joins: IndexMap<(SmolStr, SmolStr), JoinEntry>,
    /// Names tables are referenced by so far.
    aliases: IndexSet<SmolStr>,
}

impl<'a> Pass<'a> {
    fn new(schema: &'a Schema, config: CompilerConfig) -> Self {
        Self {
            schema,
            config,
            binder: Binder::new(config.placeholders),
            joins: IndexMap::new(),
            aliases: IndexSet::new(),
        }
    }

    fn subject(&mut self, model: ModelId) -> Context {
        let alias = SmolStr::new(self.schema.table(model));
        self.aliases.insert(alias.clone());
        Context { model, alias }
    }

    fn render_group(&mut self, group: &Group, ctx: &Context) -> FilterResult<Option<String>> {
        let mut parts = Vec::new();
        self.collect_parts(group, ctx, &mut parts)?;
        Ok(combine(group.combinator(), parts).map(|sql| {
            if group.is_negated() {
                format!("NOT ({})", sql)
            } else {
                sql
            }
        }))
    }

    fn collect_parts(
        &mut self,
        group: &Group,
        ctx: &Context,
        parts: &mut Vec<String>,
    ) -> FilterResult<()> {
        for child in group.children() {
            match child {
                Node::Restriction(r) => {
                    let column =
                        qualify_condition_column(&ctx.alias, r.column(), self.config.quote_tables);
                    let sql = r
                        .render(&column, &mut self.binder)
                        .map_err(|e| e.with_model(self.schema.name(ctx.model)))?;
                    parts.push(sql);
                }
                Node::Group(g) if g.combinator() == group.combinator() && !g.is_negated() => {
                    self.collect_parts(g, ctx, parts)?;
                }
                Node::Group(g) => {
                    if let Some(sql) = self.render_group(g, ctx)? {
                        parts.push(sql);
                    }
                }
                Node::Join(join) => {
                    let target = self.enter_join(ctx, join.relation(), join.kind())?;
                    if group.combinator() == Combinator::All {
                        self.collect_parts(join.body(), &target, parts)?;
                    } else if let Some(sql) = self.render_group(join.body(), &target)? {
                        parts.push(sql);
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolve an association and record its join clause.
    ///
    /// Joins are merged per association path: entering the same association
    /// from the same table twice reuses the first join and its kind. A table
    /// reached again through another path is joined under an alias.
    fn enter_join(
        &mut self,
        owner: &Context,
        relation: &str,
        kind: JoinKind,
    ) -> FilterResult<Context> {
        let schema = self.schema;
        let relation = schema
            .relation(owner.model, relation)
            .map_err(|e| e.with_operation("having"))?;

        let key = (owner.alias.clone(), relation.name.clone());
        if let Some(entry) = self.joins.get(&key) {
            trace!(alias = %entry.alias, relation = %relation.name, "Merging into existing join");
            return Ok(Context {
                model: relation.target,
                alias: entry.alias.clone(),
            });
        }

        let table = schema.table(relation.target);
        let join_table = match &relation.kind {
            RelationKind::ManyToMany(jt) => Some(jt.table_name.as_str()),
            _ => None,
        };
        let join_table_taken = join_table.is_some_and(|jt| self.aliases.contains(jt));
        let alias = self.claim_alias(table, &relation.name, &owner.alias, join_table_taken);
        if let Some(jt) = join_table {
            let jt_alias = if alias == table {
                SmolStr::new(jt)
            } else {
                SmolStr::new(format!("{}_{}", jt, alias))
            };
            self.aliases.insert(jt_alias);
        }

        let clause = relation.to_join_clause(
            &schema.join_end(owner.model).aliased(&owner.alias),
            &schema.join_end(relation.target).aliased(&alias),
            kind,
            self.config.quote_tables,
        );
        trace!(alias = %alias, clause = %clause, "Adding join");
        self.joins.insert(
            key,
            JoinEntry {
                alias: alias.clone(),
                clause,
            },
        );

        Ok(Context {
            model: relation.target,
            alias,
        })
    }

    /// The table name while it is unused, otherwise `<relation>_<owner>`
    /// with a numeric suffix until unique.
    fn claim_alias(&mut self, table: &str, relation: &str, owner: &str, force: bool) -> SmolStr {
        let mut alias = SmolStr::new(table);
        if force || self.aliases.contains(&alias) {
            let base = format!("{}_{}", relation, owner);
            alias = SmolStr::new(&base);
            let mut n = 2;
            while self.aliases.contains(&alias) {
                alias = SmolStr::new(format!("{}_{}", base, n));
                n += 1;
            }
        }
        self.aliases.insert(alias.clone());
        alias
    }

    fn resolve_clause_column(
        &mut self,
        subject: &Context,
        column: &ColumnRef,
    ) -> FilterResult<String> {
        let (ctx, name) = match column {
            ColumnRef::Literal(sql) => return Ok(sql.clone()),
            ColumnRef::Name(name) => (subject.clone(), name),
            ColumnRef::Path(relations, name) => {
                let mut ctx = subject.clone();
                for relation in relations {
                    ctx = self.enter_join(&ctx, relation, JoinKind::Inner)?;
                }
                (ctx, name)
            }
        };

        // Expressions and names outside the declared columns pass through.
        if !is_plain_identifier(name) || self.schema.has_column(ctx.model, name) == Some(false) {
            return Ok(name.to_string());
        }
        Ok(qualify_clause_column(&ctx.alias, name))
    }

    fn finish(
        mut self,
        subject: &Context,
        condition: Option<String>,
        clauses: &StructuralClauses,
    ) -> FilterResult<QuerySpec> {
        let mut order = Vec::with_capacity(clauses.order.len());
        for entry in &clauses.order {
            let column = self.resolve_clause_column(subject, &entry.column)?;
            order.push(format!("{} {}", column, entry.direction.as_sql()));
        }

        let mut group_by = Vec::with_capacity(clauses.group_by.len());
        for column in &clauses.group_by {
            group_by.push(self.resolve_clause_column(subject, column)?);
        }

        Ok(QuerySpec {
            condition,
            bind_values: self.binder.into_values(),
            joins: self.joins.into_values().map(|entry| entry.clause).collect(),
            limit: clauses.limit,
            offset: clauses.offset,
            order: (!order.is_empty()).then(|| order.join(", ")),
            group_by: (!group_by.is_empty()).then(|| group_by.join(", ")),
            select_columns: clauses.select_columns.clone(),
            distinct: clauses.distinct,
        })
    }
}

/// Join rendered parts with the combinator, parenthesizing each when there
/// is more than one.
fn combine(combinator: Combinator, mut parts: Vec<String>) -> Option<String> {
    match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(
            parts
                .iter()
                .map(|part| format!("({})", part))
                .collect::<Vec<_>>()
                .join(combinator.separator()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::join::{JoinTable, Relation};
    use crate::schema::ModelDescriptor;
    use crate::sql::PlaceholderStyle;
    use pretty_assertions::assert_eq;

    struct Fixture {
        schema: Schema,
        post: ModelId,
    }

    fn fixture() -> Fixture {
        let mut schema = Schema::new();
        let blog = schema.register(ModelDescriptor::new("Blog", "blogs"));
        let post = schema.register(
            ModelDescriptor::new("Post", "posts")
                .columns(["id", "permalink", "blog_id", "photo_id", "parent_id"]),
        );
        let photo = schema.register(ModelDescriptor::new("Photo", "photos"));
        let comment = schema.register(ModelDescriptor::new("Comment", "comments"));
        let tag = schema.register(ModelDescriptor::new("Tag", "tags"));
        schema
            .add_relation(post, Relation::belongs_to("blog", blog))
            .add_relation(post, Relation::belongs_to("photo", photo))
            .add_relation(post, Relation::has_many("comments", comment))
            .add_relation(
                post,
                Relation::many_to_many("tags", tag, JoinTable::new("posts_tags")),
            )
            .add_relation(post, Relation::belongs_to("parent", post).foreign_key("parent_id"))
            .add_relation(comment, Relation::belongs_to("photo", photo));
        Fixture { schema, post }
    }

    fn compile(f: &Fixture, scope: &Scope) -> QuerySpec {
        Compiler::new(&f.schema, CompilerConfig::default())
            .compile(f.post, scope)
            .unwrap()
    }

    #[test]
    fn test_empty_filter_has_no_condition() {
        let f = fixture();
        let spec = compile(&f, &Scope::root());
        assert_eq!(spec, QuerySpec::default());
    }

    #[test]
    fn test_single_restriction_is_bare() {
        let f = fixture();
        let mut q = Scope::root();
        q.with("permalink").equal_to("blog-post");
        let spec = compile(&f, &q);
        assert_eq!(spec.condition.as_deref(), Some(r#""posts".permalink = ?"#));
        assert_eq!(spec.bind_values, vec![FilterValue::from("blog-post")]);
    }

    #[test]
    fn test_mixed_groups_parenthesize() {
        let f = fixture();
        let mut q = Scope::root();
        q.any_of(|g| {
            g.all_of(|a| {
                a.with("blog_id").equal_to(1);
                a.with("permalink").equal_to("a");
                Ok(())
            })?;
            g.with("permalink").equal_to("b");
            Ok(())
        })
        .unwrap();

        let spec = compile(&f, &q);
        assert_eq!(
            spec.condition.as_deref(),
            Some(concat!(
                r#"(("posts".blog_id = ?) AND ("posts".permalink = ?))"#,
                r#" OR ("posts".permalink = ?)"#
            ))
        );
        assert_eq!(
            spec.bind_values,
            vec![FilterValue::Int(1), FilterValue::from("a"), FilterValue::from("b")]
        );
    }

    #[test]
    fn test_deep_nesting_keeps_precedence() {
        let f = fixture();
        let mut q = Scope::root();
        q.any_of(|g| {
            g.all_of(|a| {
                a.with("id").equal_to(1);
                a.any_of(|o| {
                    o.with("blog_id").equal_to(2);
                    o.with("blog_id").equal_to(3);
                    Ok(())
                })?;
                Ok(())
            })?;
            g.all_of(|a| {
                a.with("id").equal_to(4);
                a.with("blog_id").equal_to(5);
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

        let spec = compile(&f, &q);
        assert_eq!(
            spec.condition.as_deref(),
            Some(concat!(
                r#"(("posts".id = ?) AND (("posts".blog_id = ?) OR ("posts".blog_id = ?)))"#,
                r#" OR (("posts".id = ?) AND ("posts".blog_id = ?))"#
            ))
        );
        assert_eq!(spec.bind_values.len(), 5);
    }

    #[test]
    fn test_same_combinator_groups_are_spliced() {
        let f = fixture();
        let mut q = Scope::root();
        q.with("id").equal_to(1);
        q.all_of(|a| {
            a.with("blog_id").equal_to(2);
            a.all_of(|b| {
                b.with("permalink").equal_to("x");
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        // Empty groups contribute nothing.
        q.any_of(|_| Ok(())).unwrap();

        let spec = compile(&f, &q);
        assert_eq!(
            spec.condition.as_deref(),
            Some(concat!(
                r#"("posts".id = ?) AND ("posts".blog_id = ?)"#,
                r#" AND ("posts".permalink = ?)"#
            ))
        );
    }

    #[test]
    fn test_negated_groups() {
        let f = fixture();
        let mut q = Scope::root();
        q.none_of(|g| {
            g.with("blog_id").equal_to(1);
            g.with("blog_id").equal_to(2);
            Ok(())
        })
        .unwrap();
        q.not_all_of(|g| {
            g.with("permalink").like("%draft%");
            Ok(())
        })
        .unwrap();

        let spec = compile(&f, &q);
        assert_eq!(
            spec.condition.as_deref(),
            Some(concat!(
                r#"(NOT (("posts".blog_id = ?) OR ("posts".blog_id = ?)))"#,
                r#" AND (NOT ("posts".permalink LIKE ?))"#
            ))
        );
    }

    #[test]
    fn test_join_qualifies_with_target_table() {
        let f = fixture();
        let mut q = Scope::root();
        q.having("photo", |p| {
            p.with("format").equal_to("jpg");
            Ok(())
        })
        .unwrap();
        q.with("permalink").equal_to("x");

        let spec = compile(&f, &q);
        assert_eq!(
            spec.condition.as_deref(),
            Some(r#"("photos".format = ?) AND ("posts".permalink = ?)"#)
        );
        assert_eq!(
            spec.joins,
            vec![r#"INNER JOIN "photos" ON "photos".id = "posts".photo_id"#.to_string()]
        );
    }

    #[test]
    fn test_join_inside_any_of_stays_grouped() {
        let f = fixture();
        let mut q = Scope::root();
        q.any_of(|g| {
            g.having("photo", |p| {
                p.with("format").equal_to("jpg");
                p.with("width").gt(100);
                Ok(())
            })?;
            g.with("permalink").is_null();
            Ok(())
        })
        .unwrap();

        let spec = compile(&f, &q);
        assert_eq!(
            spec.condition.as_deref(),
            Some(concat!(
                r#"(("photos".format = ?) AND ("photos".width > ?))"#,
                r#" OR ("posts".permalink IS NULL)"#
            ))
        );
    }

    #[test]
    fn test_nested_joins_and_dedupe() {
        let f = fixture();
        let mut q = Scope::root();
        q.having("comments", |c| {
            c.having("photo", |p| {
                p.with("format").equal_to("png");
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        q.having("comments", |c| {
            c.with("body").like("%ostrich%");
            Ok(())
        })
        .unwrap();

        let spec = compile(&f, &q);
        assert_eq!(
            spec.joins,
            vec![
                r#"INNER JOIN "comments" ON "comments".post_id = "posts".id"#.to_string(),
                r#"INNER JOIN "photos" ON "photos".id = "comments".photo_id"#.to_string(),
            ]
        );
        assert_eq!(
            spec.condition.as_deref(),
            Some(r#"("photos".format = ?) AND ("comments".body LIKE ?)"#)
        );
    }

    #[test]
    fn test_first_join_kind_wins() {
        let f = fixture();
        let mut q = Scope::root();
        q.having_left("photo", |_| Ok(())).unwrap();
        q.having("photo", |p| {
            p.with("id").gt(0);
            Ok(())
        })
        .unwrap();
        let spec = compile(&f, &q);
        assert_eq!(spec.joins.len(), 1);
        assert!(spec.joins[0].starts_with("LEFT OUTER JOIN"));
    }

    #[test]
    fn test_many_to_many_join() {
        let f = fixture();
        let mut q = Scope::root();
        q.having("tags", |t| {
            t.with("name").in_list(vec!["rust", "sql"]);
            Ok(())
        })
        .unwrap();
        let spec = compile(&f, &q);
        assert_eq!(
            spec.joins,
            vec![concat!(
                r#"INNER JOIN "posts_tags" ON "posts_tags".post_id = "posts".id "#,
                r#"INNER JOIN "tags" ON "tags".id = "posts_tags".tag_id"#
            )
            .to_string()]
        );
        assert_eq!(spec.condition.as_deref(), Some(r#""tags".name IN (?)"#));
    }

    #[test]
    fn test_unknown_association() {
        let f = fixture();
        let mut q = Scope::root();
        q.having("authors", |_| Ok(())).unwrap();
        let err = Compiler::new(&f.schema, CompilerConfig::default())
            .compile(f.post, &q)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownAssociation);
        assert_eq!(err.context.operation.as_deref(), Some("having"));
    }

    #[test]
    fn test_missing_operator_fails_compile() {
        let f = fixture();
        let mut q = Scope::root();
        q.with("permalink");
        let err = Compiler::new(&f.schema, CompilerConfig::default())
            .compile(f.post, &q)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedRestriction);
        assert_eq!(err.context.model.as_deref(), Some("Post"));
    }

    #[test]
    fn test_order_and_group_resolution() {
        let f = fixture();
        let mut q = Scope::root();
        q.having("photo", |_| Ok(())).unwrap();
        q.order_by(["photo", "path"], "desc").unwrap();
        q.order("permalink").unwrap();
        q.order("LENGTH(posts.permalink)").unwrap();
        q.group_by("blog_id").unwrap();
        q.group_by(ColumnRef::literal("1")).unwrap();

        let spec = compile(&f, &q);
        assert_eq!(
            spec.order.as_deref(),
            Some("photos.path DESC, posts.permalink ASC, LENGTH(posts.permalink) ASC")
        );
        assert_eq!(spec.group_by.as_deref(), Some("posts.blog_id, 1"));
        assert_eq!(spec.joins.len(), 1);
    }

    #[test]
    fn test_order_path_adds_join() {
        let f = fixture();
        let mut q = Scope::root();
        q.order(["comments", "photo", "path"]).unwrap();
        let spec = compile(&f, &q);
        assert_eq!(spec.order.as_deref(), Some("photos.path ASC"));
        assert_eq!(spec.joins.len(), 2);
        assert_eq!(spec.condition, None);
    }

    #[test]
    fn test_structural_clauses_pass_through() {
        let f = fixture();
        let mut q = Scope::root();
        q.limit(20, Some(10)).unwrap().distinct(["permalink"]).unwrap();
        let spec = compile(&f, &q);
        assert_eq!(spec.limit, Some(10));
        assert_eq!(spec.offset, Some(20));
        assert!(spec.distinct);
        assert_eq!(spec.select_columns, Some(vec!["permalink".into()]));
    }

    #[test]
    fn test_base_condition_comes_first() {
        let f = fixture();
        let mut q = Scope::root();
        q.with("permalink").equal_to("x");
        let base = BaseCondition::new(r#""posts".blog_id = ?"#, vec![7.into()]);

        let config = CompilerConfig::default().placeholders(PlaceholderStyle::Dollar);
        let spec = Compiler::new(&f.schema, config)
            .compile_with_base(f.post, &q, Some(&base))
            .unwrap();
        assert_eq!(
            spec.condition.as_deref(),
            Some(r#"("posts".blog_id = $1) AND ("posts".permalink = $2)"#)
        );
        assert_eq!(spec.bind_values, vec![FilterValue::Int(7), FilterValue::from("x")]);
    }

    #[test]
    fn test_unquoted_tables() {
        let f = fixture();
        let mut q = Scope::root();
        q.having("blog", |b| {
            b.with("name").equal_to("Ostriches");
            Ok(())
        })
        .unwrap();
        let config = CompilerConfig::default().quote_tables(false);
        let spec = Compiler::new(&f.schema, config).compile(f.post, &q).unwrap();
        assert_eq!(spec.condition.as_deref(), Some("blogs.name = ?"));
        assert_eq!(spec.joins, vec!["INNER JOIN blogs ON blogs.id = posts.blog_id".to_string()]);
    }

    #[test]
    fn test_same_table_through_two_paths_is_aliased() {
        let f = fixture();
        let mut q = Scope::root();
        q.having("comments", |c| {
            c.having("photo", |p| {
                p.with("format").equal_to("png");
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        q.having("photo", |p| {
            p.with("format").equal_to("jpg");
            Ok(())
        })
        .unwrap();
        q.order(["photo", "path"]).unwrap();

        let spec = compile(&f, &q);
        assert_eq!(
            spec.joins,
            vec![
                r#"INNER JOIN "comments" ON "comments".post_id = "posts".id"#.to_string(),
                r#"INNER JOIN "photos" ON "photos".id = "comments".photo_id"#.to_string(),
                concat!(
                    r#"INNER JOIN "photos" AS "photo_posts""#,
                    r#" ON "photo_posts".id = "posts".photo_id"#
                )
                .to_string(),
            ]
        );
        assert_eq!(
            spec.condition.as_deref(),
            Some(r#"("photos".format = ?) AND ("photo_posts".format = ?)"#)
        );
        assert_eq!(spec.order.as_deref(), Some("photo_posts.path ASC"));
    }

    #[test]
    fn test_self_referential_join_is_aliased() {
        let f = fixture();
        let mut q = Scope::root();
        q.having("parent", |p| {
            p.with("id").equal_to(1);
            Ok(())
        })
        .unwrap();
        q.with("permalink").equal_to("child");
        q.order(["parent", "permalink"]).unwrap();

        let spec = compile(&f, &q);
        assert_eq!(
            spec.joins,
            vec![concat!(
                r#"INNER JOIN "posts" AS "parent_posts""#,
                r#" ON "parent_posts".id = "posts".parent_id"#
            )
            .to_string()]
        );
        assert_eq!(
            spec.condition.as_deref(),
            Some(r#"("parent_posts".id = ?) AND ("posts".permalink = ?)"#)
        );
        assert_eq!(spec.order.as_deref(), Some("parent_posts.permalink ASC"));
    }

    #[test]
    fn test_nested_self_reference_gets_fresh_alias() {
        let f = fixture();
        let mut q = Scope::root();
        q.having("parent", |p| {
            p.having("parent", |g| {
                g.with("id").equal_to(1);
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

        let spec = compile(&f, &q);
        assert_eq!(spec.joins.len(), 2);
        assert_eq!(
            spec.joins[1],
            concat!(
                r#"INNER JOIN "posts" AS "parent_parent_posts""#,
                r#" ON "parent_parent_posts".id = "parent_posts".parent_id"#
            )
        );
        assert_eq!(spec.condition.as_deref(), Some(r#""parent_parent_posts".id = ?"#));
    }

    #[test]
    fn test_expressions_in_clauses_are_verbatim() {
        let mut schema = Schema::new();
        let blog = schema.register(ModelDescriptor::new("Blog", "blogs"));
        let mut q = Scope::root();
        q.order("RANDOM()").unwrap();
        q.order("name").unwrap();
        q.group_by("COUNT(*)").unwrap();

        let spec = Compiler::new(&schema, CompilerConfig::default())
            .compile(blog, &q)
            .unwrap();
        assert_eq!(spec.order.as_deref(), Some("RANDOM() ASC, blogs.name ASC"));
        assert_eq!(spec.group_by.as_deref(), Some("COUNT(*)"));
    }
}
