//! # record-filter-query
//!
//! A small compiler from a nested filter DSL to parameterized SQL fragments.
//!
//! This crate provides:
//! - A scope-based DSL for restrictions, AND/OR groups and joins
//! - Named, parameterized filters registered per record type and inherited by subtypes
//! - Chaining of named filters into a single query
//! - A compiler producing a condition, bind values, deduplicated joins and structural clauses
//! - Lazily compiled, cached filter handles over an async executor
//!
//! ## Restrictions and groups
//!
//! ```rust
//! use record_filter_query::{Compiler, CompilerConfig, ModelDescriptor, Schema, Scope};
//!
//! let mut schema = Schema::new();
//! let post = schema.register(ModelDescriptor::new("Post", "posts"));
//!
//! let mut q = Scope::root();
//! q.any_of(|g| {
//!     g.all_of(|a| {
//!         a.with("blog_id").equal_to(1);
//!         a.with("permalink").equal_to("a");
//!         Ok(())
//!     })?;
//!     g.with("permalink").equal_to("b");
//!     Ok(())
//! })?;
//!
//! let spec = Compiler::new(&schema, CompilerConfig::default()).compile(post, &q)?;
//! assert_eq!(
//!     spec.condition.as_deref(),
//!     Some(r#"(("posts".blog_id = ?) AND ("posts".permalink = ?)) OR ("posts".permalink = ?)"#)
//! );
//! assert_eq!(spec.bind_values.len(), 3);
//! # Ok::<(), record_filter_query::FilterError>(())
//! ```
//!
//! ## Joins
//!
//! ```rust
//! use record_filter_query::{Compiler, CompilerConfig, ModelDescriptor, Relation, Schema, Scope};
//!
//! let mut schema = Schema::new();
//! let post = schema.register(ModelDescriptor::new("Post", "posts"));
//! let photo = schema.register(ModelDescriptor::new("Photo", "photos"));
//! schema.add_relation(post, Relation::belongs_to("photo", photo));
//!
//! let mut q = Scope::root();
//! q.having("photo", |p| {
//!     p.with("format").equal_to("jpg");
//!     Ok(())
//! })?;
//! q.order_by(["photo", "path"], "desc")?;
//!
//! let spec = Compiler::new(&schema, CompilerConfig::default()).compile(post, &q)?;
//! assert_eq!(spec.joins, vec![r#"INNER JOIN "photos" ON "photos".id = "posts".photo_id"#]);
//! assert_eq!(spec.order.as_deref(), Some("photos.path DESC"));
//! # Ok::<(), record_filter_query::FilterError>(())
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use record_filter_query::{ErrorCode, Scope};
//!
//! let mut q = Scope::root();
//! let err = q
//!     .having("comments", |c| {
//!         c.limit(5, None)?;
//!         Ok(())
//!     })
//!     .unwrap_err();
//! assert_eq!(err.code, ErrorCode::NoSuchOperation);
//! ```

pub mod clauses;
pub mod column;
pub mod compile;
pub mod config;
pub mod dsl;
pub mod error;
pub mod executor;
pub mod fragment;
pub mod handle;
pub mod join;
pub mod logging;
pub mod restriction;
pub mod schema;
pub mod spec;
pub mod sql;
pub mod tree;
pub mod value;

pub use clauses::{IntoDirection, OrderEntry, SortOrder, StructuralClauses};
pub use column::ColumnRef;
pub use compile::{BaseCondition, Compiler};
pub use config::{CompilerConfig, EnvSource, MapEnvSource, StdEnvSource};
pub use dsl::{Scope, ScopeKind};
pub use error::{ErrorCode, ErrorContext, FilterError, FilterResult};
pub use executor::{CallKind, ExecutorCall, QueryExecutor, RecordingExecutor};
pub use fragment::{Fragment, FragmentArgs, FragmentParam, ParamKind};
pub use handle::{
    Filter, Filterable, FragmentCall, ModelHandle, Repository, ScopedCollection, Subject,
};
pub use join::{JoinKind, JoinTable, Relation, RelationKind};
pub use restriction::{IntoBetween, Operator, Restriction};
pub use schema::{ModelDescriptor, ModelId, Schema};
pub use spec::QuerySpec;
pub use sql::PlaceholderStyle;
pub use tree::{Combinator, Group, JoinScope, Node};
pub use value::FilterValue;

// Re-export logging utilities
pub use logging::{init as init_logging, is_debug_enabled};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::clauses::SortOrder;
    pub use crate::column::ColumnRef;
    pub use crate::config::CompilerConfig;
    pub use crate::dsl::Scope;
    pub use crate::error::{FilterError, FilterResult};
    pub use crate::executor::QueryExecutor;
    pub use crate::fragment::{FragmentArgs, FragmentParam};
    pub use crate::handle::{Filter, Filterable, Repository};
    pub use crate::join::{JoinTable, Relation};
    pub use crate::schema::{ModelDescriptor, Schema};
    pub use crate::spec::QuerySpec;
    pub use crate::value::FilterValue;
}
