//! Record type descriptors, associations and the fragment registry.
//!
//! Record types live in an arena indexed by [`ModelId`]. A subtype points at
//! its parent and inherits the parent's table, columns, associations and
//! fragments.
//!
//! ```rust
//! use record_filter_query::{ModelDescriptor, Relation, Schema};
//!
//! let mut schema = Schema::new();
//! let photo = schema.register(ModelDescriptor::new("Photo", "photos"));
//! let post = schema.register(
//!     ModelDescriptor::new("Post", "posts").columns(["id", "permalink", "blog_id"]),
//! );
//! schema.add_relation(post, Relation::belongs_to("photo", photo));
//!
//! let featured = schema.register_subtype(post, "FeaturedPost");
//! assert_eq!(schema.table(featured), "posts");
//! assert!(schema.relation(featured, "photo").is_ok());
//! ```

use indexmap::{IndexMap, IndexSet};
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::dsl::Scope;
use crate::error::{FilterError, FilterResult};
use crate::fragment::{Fragment, FragmentArgs, FragmentParam};
use crate::join::{JoinEnd, Relation};

/// Index of a record type in a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(usize);

impl ModelId {
    /// Build an id from a raw arena index.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// The raw arena index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Description of one record type.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    name: SmolStr,
    table: Option<SmolStr>,
    parent: Option<ModelId>,
    columns: Vec<SmolStr>,
    relations: IndexMap<SmolStr, Relation>,
    fragments: IndexMap<SmolStr, Fragment>,
}

impl ModelDescriptor {
    /// Describe a record type stored in `table`.
    pub fn new(name: impl AsRef<str>, table: impl AsRef<str>) -> Self {
        Self {
            name: SmolStr::new(name.as_ref()),
            table: Some(SmolStr::new(table.as_ref())),
            parent: None,
            columns: Vec::new(),
            relations: IndexMap::new(),
            fragments: IndexMap::new(),
        }
    }

    /// Declare the known columns.
    ///
    /// Order and group names that are not among the declared columns are
    /// emitted verbatim. Types without declared columns treat every name as
    /// a column.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns = columns.into_iter().map(|c| SmolStr::new(c.as_ref())).collect();
        self
    }

    /// The record type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parent type, for subtypes.
    pub fn parent(&self) -> Option<ModelId> {
        self.parent
    }
}

/// Arena of record types with their associations and named fragments.
///
/// Populated once at startup; afterwards it is only read.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    models: Vec<ModelDescriptor>,
    by_name: IndexMap<SmolStr, ModelId>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record type.
    ///
    /// A name that is already registered is rebound to the new type; the
    /// earlier type stays reachable through its [`ModelId`] only. Use
    /// [`try_register`](Self::try_register) to reject duplicates instead.
    pub fn register(&mut self, descriptor: ModelDescriptor) -> ModelId {
        let id = ModelId(self.models.len());
        debug!(model = %descriptor.name, id = id.0, "Registering record type");
        if let Some(previous) = self.by_name.insert(descriptor.name.clone(), id) {
            warn!(
                model = %descriptor.name,
                previous = previous.0,
                id = id.0,
                "Record type name registered twice, rebinding to the newer type"
            );
        }
        self.models.push(descriptor);
        id
    }

    /// Register a record type, failing if its name is taken.
    pub fn try_register(&mut self, descriptor: ModelDescriptor) -> FilterResult<ModelId> {
        if self.by_name.contains_key(descriptor.name.as_str()) {
            return Err(FilterError::duplicate_model(descriptor.name.as_str()));
        }
        Ok(self.register(descriptor))
    }

    /// Register a subtype of `parent`, sharing its table.
    pub fn register_subtype(&mut self, parent: ModelId, name: impl AsRef<str>) -> ModelId {
        let mut descriptor = ModelDescriptor::new(name, "");
        descriptor.table = None;
        descriptor.parent = Some(parent);
        self.register(descriptor)
    }

    /// Register a subtype of `parent` stored in its own table.
    pub fn register_subtype_with_table(
        &mut self,
        parent: ModelId,
        descriptor: ModelDescriptor,
    ) -> ModelId {
        let mut descriptor = descriptor;
        descriptor.parent = Some(parent);
        self.register(descriptor)
    }

    /// Look up a record type by name.
    pub fn find(&self, name: &str) -> FilterResult<ModelId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| FilterError::unknown_model(name))
    }

    /// Get the descriptor of a record type.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this schema.
    pub fn descriptor(&self, id: ModelId) -> &ModelDescriptor {
        &self.models[id.0]
    }

    fn descriptor_mut(&mut self, id: ModelId) -> &mut ModelDescriptor {
        &mut self.models[id.0]
    }

    /// The type followed by its ancestors, nearest first.
    pub fn lineage(&self, id: ModelId) -> impl Iterator<Item = ModelId> + '_ {
        std::iter::successors(Some(id), move |current| self.descriptor(*current).parent)
    }

    /// The record type name.
    pub fn name(&self, id: ModelId) -> &str {
        self.descriptor(id).name()
    }

    /// Name of the outermost ancestor, used for default foreign keys.
    pub fn base_name(&self, id: ModelId) -> &str {
        let root = self.lineage(id).last().unwrap_or(id);
        self.name(root)
    }

    /// Storage table, inherited from the nearest ancestor that declares one.
    pub fn table(&self, id: ModelId) -> &str {
        self.lineage(id)
            .find_map(|m| self.descriptor(m).table.as_deref())
            .unwrap_or_else(|| self.name(id))
    }

    /// Check whether `column` is a declared column of the type or an ancestor.
    ///
    /// Returns `None` when no type in the lineage declares columns.
    pub fn has_column(&self, id: ModelId, column: &str) -> Option<bool> {
        let mut declared = false;
        for model in self.lineage(id) {
            let columns = &self.descriptor(model).columns;
            if columns.iter().any(|c| c == column) {
                return Some(true);
            }
            declared |= !columns.is_empty();
        }
        declared.then_some(false)
    }

    /// The join end describing a record type.
    pub fn join_end(&self, id: ModelId) -> JoinEnd<'_> {
        JoinEnd::new(self.table(id), self.base_name(id))
    }

    // ============== Associations ==============

    /// Add an association to a record type.
    pub fn add_relation(&mut self, owner: ModelId, relation: Relation) -> &mut Self {
        debug!(
            model = %self.name(owner),
            relation = %relation.name,
            "Adding association"
        );
        self.descriptor_mut(owner)
            .relations
            .insert(relation.name.clone(), relation);
        self
    }

    /// Find an association on the type or its ancestors.
    pub fn relation(&self, owner: ModelId, name: &str) -> FilterResult<&Relation> {
        self.lineage(owner)
            .find_map(|m| self.descriptor(m).relations.get(name))
            .ok_or_else(|| FilterError::unknown_association(self.name(owner), name))
    }

    // ============== Fragment Registry ==============

    /// Register a named fragment on a record type.
    ///
    /// Fails with `DuplicateFragmentName` if the type or any ancestor already
    /// has a fragment with this name.
    pub fn define_fragment<F>(
        &mut self,
        model: ModelId,
        name: impl AsRef<str>,
        params: impl IntoIterator<Item = FragmentParam>,
        body: F,
    ) -> FilterResult<()>
    where
        F: Fn(&mut Scope, &FragmentArgs) -> FilterResult<()> + Send + Sync + 'static,
    {
        let name = name.as_ref();
        if self.lineage(model).any(|m| self.descriptor(m).fragments.contains_key(name)) {
            return Err(FilterError::duplicate_fragment(self.name(model), name));
        }

        let fragment = Fragment::new(name, params, body);
        debug!(
            model = %self.name(model),
            fragment = name,
            params = fragment.params().len(),
            "Defining named filter"
        );
        self.descriptor_mut(model)
            .fragments
            .insert(SmolStr::new(name), fragment);
        Ok(())
    }

    /// Find a fragment on the type or its ancestors.
    pub fn fragment(&self, model: ModelId, name: &str) -> FilterResult<&Fragment> {
        self.lineage(model)
            .find_map(|m| self.descriptor(m).fragments.get(name))
            .ok_or_else(|| FilterError::unknown_fragment(self.name(model), name))
    }

    /// Own fragment names followed by ancestor names, without duplicates.
    pub fn all_fragment_names(&self, model: ModelId) -> Vec<SmolStr> {
        let names: IndexSet<SmolStr> = self
            .lineage(model)
            .flat_map(|m| self.descriptor(m).fragments.keys().cloned())
            .collect();
        names.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn noop(_: &mut Scope, _: &FragmentArgs) -> FilterResult<()> {
        Ok(())
    }

    fn blog_schema() -> (Schema, ModelId, ModelId, ModelId) {
        let mut schema = Schema::new();
        let blog = schema.register(ModelDescriptor::new("Blog", "blogs"));
        let post = schema.register(
            ModelDescriptor::new("Post", "posts").columns(["id", "permalink", "blog_id"]),
        );
        let featured = schema.register_subtype(post, "FeaturedPost");
        schema.add_relation(blog, Relation::has_many("posts", post));
        (schema, blog, post, featured)
    }

    #[test]
    fn test_lookup_by_name() {
        let (schema, blog, _, _) = blog_schema();
        assert_eq!(schema.find("Blog").unwrap(), blog);
        assert_eq!(schema.find("Comment").unwrap_err().code, ErrorCode::UnknownModel);
    }

    #[test]
    fn test_duplicate_type_names() {
        let (mut schema, blog, _, _) = blog_schema();
        let err = schema
            .try_register(ModelDescriptor::new("Blog", "weblogs"))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateModel);
        assert_eq!(schema.find("Blog").unwrap(), blog);

        let rebound = schema.register(ModelDescriptor::new("Blog", "weblogs"));
        assert_eq!(schema.find("Blog").unwrap(), rebound);
        assert_eq!(schema.table(blog), "blogs");
    }

    #[test]
    fn test_subtype_inherits_table_and_columns() {
        let (schema, _, post, featured) = blog_schema();
        assert_eq!(schema.table(featured), "posts");
        assert_eq!(schema.base_name(featured), "Post");
        assert_eq!(schema.lineage(featured).collect::<Vec<_>>(), vec![featured, post]);
        assert_eq!(schema.has_column(featured, "permalink"), Some(true));
        assert_eq!(schema.has_column(featured, "LENGTH(permalink)"), Some(false));
    }

    #[test]
    fn test_undeclared_columns_are_unknown() {
        let (schema, blog, _, _) = blog_schema();
        assert_eq!(schema.has_column(blog, "anything"), None);
    }

    #[test]
    fn test_unknown_association() {
        let (schema, blog, _, _) = blog_schema();
        assert!(schema.relation(blog, "posts").is_ok());
        let err = schema.relation(blog, "authors").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownAssociation);
    }

    #[test]
    fn test_duplicate_fragment_on_same_type() {
        let (mut schema, _, post, _) = blog_schema();
        schema.define_fragment(post, "published", [], noop).unwrap();
        let err = schema.define_fragment(post, "published", [], noop).unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateFragmentName);
    }

    #[test]
    fn test_duplicate_fragment_on_subtype() {
        let (mut schema, _, post, featured) = blog_schema();
        schema.define_fragment(post, "published", [], noop).unwrap();
        let err = schema.define_fragment(featured, "published", [], noop).unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateFragmentName);
        assert_eq!(err.context.model.as_deref(), Some("FeaturedPost"));
    }

    #[test]
    fn test_all_fragment_names_unions_ancestors() {
        let (mut schema, _, post, featured) = blog_schema();
        schema.define_fragment(featured, "highlighted", [], noop).unwrap();
        // Defined on the parent after the subtype, so both carry the name.
        schema.define_fragment(featured, "recent", [], noop).unwrap();
        schema.define_fragment(post, "recent", [], noop).unwrap();
        schema.define_fragment(post, "published", [], noop).unwrap();

        let names = schema.all_fragment_names(featured);
        assert_eq!(names, vec!["highlighted", "recent", "published"]);
        assert_eq!(schema.all_fragment_names(post), vec!["recent", "published"]);
    }

    #[test]
    fn test_fragment_lookup_through_ancestors() {
        let (mut schema, _, post, featured) = blog_schema();
        schema.define_fragment(post, "published", [], noop).unwrap();
        assert_eq!(schema.fragment(featured, "published").unwrap().name(), "published");
        let err = schema.fragment(featured, "missing").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownFragment);
    }
}
