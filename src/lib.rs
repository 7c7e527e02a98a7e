//! # record-filter
//!
//! Declarative, chainable record filters compiled to parameterized SQL.
//!
//! record-filter provides:
//! - A nested DSL for restrictions, AND/OR groups and joins into related collections
//! - Named, parameterized filters registered per record type and inherited by subtypes
//! - Chaining of named filters into one query with merged joins and clauses
//! - Lazily compiled, cached filter handles over any async executor
//!
//! ## Quick Start
//!
//! ```rust
//! use record_filter::prelude::*;
//! use record_filter::RecordingExecutor;
//!
//! let mut schema = Schema::new();
//! let blog = schema.register(ModelDescriptor::new("Blog", "blogs"));
//! let post = schema.register(ModelDescriptor::new("Post", "posts"));
//! schema.add_relation(post, Relation::belongs_to("blog", blog));
//!
//! schema.define_fragment(post, "on_blog", [FragmentParam::scalar("name")], |q, args| {
//!     q.having("blog", |b| {
//!         b.with("name").equal_to(args[0].clone());
//!         Ok(())
//!     })?;
//!     Ok(())
//! })?;
//! schema.define_fragment(post, "newest", [FragmentParam::scalar("count")], |q, args| {
//!     q.order_by("created_at", SortOrder::Desc)?;
//!     if let FilterValue::Int(n) = args[0] {
//!         q.limit(n as u64, None)?;
//!     }
//!     Ok(())
//! })?;
//!
//! let repo = Repository::new(schema, RecordingExecutor::<()>::new(Vec::new()));
//! let filter = repo
//!     .model("Post")?
//!     .fragment("on_blog", ["Ostriches"])?
//!     .fragment("newest", [5])?;
//!
//! let spec = filter.spec()?;
//! assert_eq!(spec.condition.as_deref(), Some(r#""blogs".name = ?"#));
//! assert_eq!(spec.joins, vec![r#"INNER JOIN "blogs" ON "blogs".id = "posts".blog_id"#]);
//! assert_eq!(spec.order.as_deref(), Some("posts.created_at DESC"));
//! assert_eq!(spec.limit, Some(5));
//! # Ok::<(), record_filter::FilterError>(())
//! ```
//!
//! ## Crate Organization
//!
//! - [`query`] - the DSL, registry, compiler and handles (`record-filter-query`)

#![cfg_attr(docsrs, feature(doc_cfg))]

/// The filter DSL, registry, compiler and handles.
pub mod query {
    pub use record_filter_query::*;
}

pub use record_filter_query::{
    BaseCondition, ColumnRef, Compiler, CompilerConfig, ErrorCode, Filter, FilterError,
    FilterResult, FilterValue, Filterable, FragmentArgs, FragmentParam, JoinKind, JoinTable,
    ModelDescriptor, ModelHandle, ModelId, PlaceholderStyle, QueryExecutor, QuerySpec,
    RecordingExecutor, Relation, Repository, Schema, Scope, ScopedCollection, SortOrder,
};

/// Logging setup.
pub use record_filter_query::logging;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use record_filter_query::prelude::*;
}
