//! Filter handles and the `Filterable` capability.
//!
//! A [`Repository`] ties a schema to an executor. Filters start from a
//! [`ModelHandle`] (every record of a type) or a [`ScopedCollection`] (an
//! already restricted subset, such as a blog's posts); both implement
//! [`Filterable`].
//!
//! ```rust
//! use record_filter_query::{
//!     Filterable, FragmentParam, ModelDescriptor, RecordingExecutor, Repository, Schema,
//! };
//!
//! let mut schema = Schema::new();
//! let post = schema.register(ModelDescriptor::new("Post", "posts"));
//! schema.define_fragment(post, "with_permalink", [FragmentParam::scalar("permalink")], |q, args| {
//!     q.with("permalink").equal_to(args[0].clone());
//!     Ok(())
//! })?;
//!
//! let repo = Repository::new(schema, RecordingExecutor::new(vec![1u32, 2]));
//! let filter = repo.model("Post")?.fragment("with_permalink", ["blog-post"])?;
//! assert_eq!(filter.spec()?.condition.as_deref(), Some(r#""posts".permalink = ?"#));
//! # Ok::<(), record_filter_query::FilterError>(())
//! ```

use std::fmt;
use std::sync::OnceLock;

use smol_str::SmolStr;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::compile::{BaseCondition, Compiler};
use crate::config::CompilerConfig;
use crate::dsl::Scope;
use crate::error::FilterResult;
use crate::executor::QueryExecutor;
use crate::fragment::FragmentArgs;
use crate::schema::{ModelId, Schema};
use crate::spec::QuerySpec;
use crate::value::FilterValue;

/// A schema paired with the executor that runs its filters.
pub struct Repository<E> {
    schema: Schema,
    executor: E,
    config: CompilerConfig,
}

impl<E: QueryExecutor> Repository<E> {
    /// Create a repository with the default compiler configuration.
    pub fn new(schema: Schema, executor: E) -> Self {
        Self {
            schema,
            executor,
            config: CompilerConfig::default(),
        }
    }

    /// Replace the compiler configuration.
    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// The schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// The compiler configuration.
    pub fn config(&self) -> CompilerConfig {
        self.config
    }

    /// A handle over every record of the named type.
    pub fn model(&self, name: &str) -> FilterResult<ModelHandle<'_, E>> {
        let model = self.schema.find(name)?;
        Ok(self.model_by_id(model))
    }

    /// A handle over every record of a type.
    pub fn model_by_id(&self, model: ModelId) -> ModelHandle<'_, E> {
        ModelHandle { repo: self, model }
    }

    /// A collection of `model` records restricted by a hand-written condition.
    pub fn scoped(&self, model: ModelId, base: BaseCondition) -> ScopedCollection<'_, E> {
        ScopedCollection {
            repo: self,
            model,
            base,
        }
    }

    /// The records associated with one owner row, e.g. the posts of blog 3.
    ///
    /// `owner_key` is the owner's primary key, or for `belongs_to` the
    /// foreign key value held by the owner.
    pub fn association(
        &self,
        owner: ModelId,
        relation: &str,
        owner_key: impl Into<FilterValue>,
    ) -> FilterResult<ScopedCollection<'_, E>> {
        let rel = self.schema.relation(owner, relation)?;
        let condition = rel.to_association_condition(
            &self.schema.join_end(owner),
            &self.schema.join_end(rel.target),
            self.config.quote_tables,
        );
        debug!(
            owner = %self.schema.name(owner),
            relation,
            condition = %condition,
            "Scoping filter to association"
        );
        Ok(self.scoped(rel.target, BaseCondition::new(condition, vec![owner_key.into()])))
    }
}

impl<E> fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("schema", &self.schema)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// What a filter is applied to.
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    /// Every record of a type.
    Model(ModelId),
    /// A restricted subset of a type.
    Scoped {
        /// The record type.
        model: ModelId,
        /// The restriction ANDed in front of every filter.
        base: BaseCondition,
    },
}

impl Subject {
    /// The record type.
    pub fn model(&self) -> ModelId {
        match self {
            Self::Model(model) | Self::Scoped { model, .. } => *model,
        }
    }

    /// The base condition of a scoped subject.
    pub fn base(&self) -> Option<&BaseCondition> {
        match self {
            Self::Model(_) => None,
            Self::Scoped { base, .. } => Some(base),
        }
    }
}

/// Anything filters can be built on.
pub trait Filterable<'r, E: QueryExecutor + 'r> {
    /// The repository the subject belongs to.
    fn repository(&self) -> &'r Repository<E>;

    /// The subject new filters apply to.
    fn subject(&self) -> Subject;

    /// An unrestricted handle.
    fn all(&self) -> Filter<'r, E> {
        Filter::new(self.repository(), self.subject())
    }

    /// Build an ad hoc filter.
    fn filter<F>(&self, f: F) -> FilterResult<Filter<'r, E>>
    where
        F: FnOnce(&mut Scope) -> FilterResult<()>,
    {
        self.all().filter(f)
    }

    /// Invoke a named filter.
    fn fragment(&self, name: &str, args: impl Into<FragmentArgs>) -> FilterResult<Filter<'r, E>> {
        self.all().fragment(name, args)
    }

    /// Named filters available on the subject's type.
    fn fragment_names(&self) -> Vec<SmolStr> {
        self.repository()
            .schema()
            .all_fragment_names(self.subject().model())
    }
}

/// Every record of one type.
pub struct ModelHandle<'r, E> {
    repo: &'r Repository<E>,
    model: ModelId,
}

impl<'r, E: QueryExecutor> ModelHandle<'r, E> {
    /// The record type.
    pub fn id(&self) -> ModelId {
        self.model
    }

    /// The storage table.
    pub fn table(&self) -> &'r str {
        self.repo.schema.table(self.model)
    }

    /// The records associated with one row of this type.
    pub fn association(
        &self,
        relation: &str,
        owner_key: impl Into<FilterValue>,
    ) -> FilterResult<ScopedCollection<'r, E>> {
        self.repo.association(self.model, relation, owner_key)
    }
}

impl<'r, E: QueryExecutor + 'r> Filterable<'r, E> for ModelHandle<'r, E> {
    fn repository(&self) -> &'r Repository<E> {
        self.repo
    }

    fn subject(&self) -> Subject {
        Subject::Model(self.model)
    }
}

/// An already restricted subset of one type.
pub struct ScopedCollection<'r, E> {
    repo: &'r Repository<E>,
    model: ModelId,
    base: BaseCondition,
}

impl<E> ScopedCollection<'_, E> {
    /// The record type.
    pub fn id(&self) -> ModelId {
        self.model
    }

    /// The restriction applied to every filter.
    pub fn base(&self) -> &BaseCondition {
        &self.base
    }
}

impl<'r, E: QueryExecutor + 'r> Filterable<'r, E> for ScopedCollection<'r, E> {
    fn repository(&self) -> &'r Repository<E> {
        self.repo
    }

    fn subject(&self) -> Subject {
        Subject::Scoped {
            model: self.model,
            base: self.base.clone(),
        }
    }
}

/// One named filter invocation in a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentCall {
    /// Fragment name.
    pub name: SmolStr,
    /// Bound arguments.
    pub args: FragmentArgs,
}

/// A built filter.
///
/// Compiles at most once, on first access to [`spec`](Self::spec), and
/// caches the executor's records and count. Extending the filter consumes
/// the handle and returns a new one.
pub struct Filter<'r, E: QueryExecutor> {
    repo: &'r Repository<E>,
    subject: Subject,
    chain: Vec<FragmentCall>,
    scope: Scope,
    spec: OnceLock<QuerySpec>,
    records: OnceCell<Vec<E::Record>>,
    count: OnceCell<u64>,
}

impl<'r, E: QueryExecutor> Filter<'r, E> {
    fn new(repo: &'r Repository<E>, subject: Subject) -> Self {
        Self {
            repo,
            subject,
            chain: Vec::new(),
            scope: Scope::root(),
            spec: OnceLock::new(),
            records: OnceCell::new(),
            count: OnceCell::new(),
        }
    }

    /// Drop memoized state ahead of extending the tree.
    fn extend(self) -> Self {
        Self {
            spec: OnceLock::new(),
            records: OnceCell::new(),
            count: OnceCell::new(),
            ..self
        }
    }

    /// Add an ad hoc block to this filter.
    pub fn filter<F>(self, f: F) -> FilterResult<Self>
    where
        F: FnOnce(&mut Scope) -> FilterResult<()>,
    {
        let mut next = self.extend();
        f(&mut next.scope)?;
        Ok(next)
    }

    /// Chain a named filter onto this one.
    ///
    /// The fragment's conditions are ANDed with the existing ones, its joins
    /// merged and its structural clauses folded in.
    pub fn fragment(self, name: &str, args: impl Into<FragmentArgs>) -> FilterResult<Self> {
        let args = args.into();
        let repo = self.repo;
        let model = self.subject.model();
        let fragment = repo.schema.fragment(model, name)?;

        crate::filter_debug!(
            model = %repo.schema.name(model),
            fragment = name,
            args = ?args,
            "Applying named filter"
        );

        let mut next = self.extend();
        fragment.apply(&mut next.scope, &args)?;
        next.chain.push(FragmentCall {
            name: SmolStr::new(name),
            args,
        });
        Ok(next)
    }

    /// What this filter applies to.
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Named filters applied so far, in call order.
    pub fn chain(&self) -> &[FragmentCall] {
        &self.chain
    }

    /// The built tree.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Named filters available on the subject's type.
    pub fn fragment_names(&self) -> Vec<SmolStr> {
        self.repo.schema.all_fragment_names(self.subject.model())
    }

    /// The storage table of the subject.
    pub fn table(&self) -> &'r str {
        self.repo.schema.table(self.subject.model())
    }

    /// Check if the filter has been compiled.
    pub fn is_compiled(&self) -> bool {
        self.spec.get().is_some()
    }

    /// The compiled query, compiling on first access.
    pub fn spec(&self) -> FilterResult<&QuerySpec> {
        if let Some(spec) = self.spec.get() {
            return Ok(spec);
        }

        let compiled = Compiler::new(&self.repo.schema, self.repo.config).compile_with_base(
            self.subject.model(),
            &self.scope,
            self.subject.base(),
        )?;
        Ok(self.spec.get_or_init(|| compiled))
    }

    /// The matching records, loaded on first access.
    pub async fn records(&self) -> FilterResult<&[E::Record]> {
        let records = self
            .records
            .get_or_try_init(|| async {
                let spec = self.spec()?;
                debug!(table = self.table(), "Loading filtered records");
                self.repo.executor.find(self.table(), spec).await
            })
            .await?;
        Ok(records.as_slice())
    }

    /// Consume the handle, yielding the matching records.
    pub async fn into_records(mut self) -> FilterResult<Vec<E::Record>> {
        if let Some(records) = self.records.take() {
            return Ok(records);
        }
        let spec = self.spec()?;
        self.repo.executor.find(self.table(), spec).await
    }

    /// The number of matching records, counted on first access.
    pub async fn count(&self) -> FilterResult<u64> {
        let count = self
            .count
            .get_or_try_init(|| async {
                let spec = self.spec()?;
                self.repo.executor.count(self.table(), spec).await
            })
            .await?;
        Ok(*count)
    }
}

impl<E: QueryExecutor> fmt::Debug for Filter<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("table", &self.table())
            .field("subject", &self.subject)
            .field("chain", &self.chain)
            .field("spec", &self.spec.get())
            .finish_non_exhaustive()
    }
}
