//! Named, parameterized filter fragments.
//!
//! A fragment is a stored closure that appends conditions, joins and
//! structural clauses to the outermost scope of a filter. Fragments are
//! registered on a record type through
//! [`Schema::define_fragment`](crate::Schema::define_fragment) and invoked by
//! name, so several can be chained into one query.
//!
//! ```rust
//! use record_filter_query::{FragmentParam, Schema, ModelDescriptor};
//!
//! let mut schema = Schema::new();
//! let post = schema.register(ModelDescriptor::new("Post", "posts"));
//! schema
//!     .define_fragment(post, "created_after", [FragmentParam::scalar("time")], |q, args| {
//!         q.with("created_at").gt(args[0].clone());
//!         Ok(())
//!     })
//!     .unwrap();
//! ```

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::dsl::Scope;
use crate::error::{FilterError, FilterResult};
use crate::value::FilterValue;

/// Signature of a fragment body.
pub type FragmentBody = dyn Fn(&mut Scope, &FragmentArgs) -> FilterResult<()> + Send + Sync;

/// Shape a fragment parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Any value, including null and lists.
    Any,
    /// A non-list value.
    Scalar,
    /// A list value.
    List,
}

impl ParamKind {
    fn accepts(&self, value: &FilterValue) -> bool {
        match self {
            Self::Any => true,
            Self::Scalar => !value.is_list(),
            Self::List => value.is_list(),
        }
    }
}

/// A declared fragment parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentParam {
    /// Parameter name, for error messages.
    pub name: SmolStr,
    /// Accepted shape.
    pub kind: ParamKind,
}

impl FragmentParam {
    /// A parameter accepting any value.
    pub fn any(name: impl AsRef<str>) -> Self {
        Self::new(name, ParamKind::Any)
    }

    /// A parameter accepting a non-list value.
    pub fn scalar(name: impl AsRef<str>) -> Self {
        Self::new(name, ParamKind::Scalar)
    }

    /// A parameter accepting a list value.
    pub fn list(name: impl AsRef<str>) -> Self {
        Self::new(name, ParamKind::List)
    }

    fn new(name: impl AsRef<str>, kind: ParamKind) -> Self {
        Self {
            name: SmolStr::new(name.as_ref()),
            kind,
        }
    }
}

/// Arguments bound to one fragment invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragmentArgs(Vec<FilterValue>);

impl FragmentArgs {
    /// Wrap call-time values.
    pub fn new(values: Vec<FilterValue>) -> Self {
        Self(values)
    }

    /// Get an argument by position.
    pub fn get(&self, index: usize) -> Option<&FilterValue> {
        self.0.get(index)
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the arguments.
    pub fn iter(&self) -> std::slice::Iter<'_, FilterValue> {
        self.0.iter()
    }
}

impl Index<usize> for FragmentArgs {
    type Output = FilterValue;

    fn index(&self, index: usize) -> &FilterValue {
        &self.0[index]
    }
}

impl From<()> for FragmentArgs {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<Vec<FilterValue>> for FragmentArgs {
    fn from(values: Vec<FilterValue>) -> Self {
        Self(values)
    }
}

impl<T: Into<FilterValue>, const N: usize> From<[T; N]> for FragmentArgs {
    fn from(values: [T; N]) -> Self {
        Self(values.into_iter().map(Into::into).collect())
    }
}

/// A registered fragment.
#[derive(Clone)]
pub struct Fragment {
    name: SmolStr,
    params: Vec<FragmentParam>,
    body: Arc<FragmentBody>,
}

impl Fragment {
    /// Create a fragment from its parts.
    pub fn new<F>(
        name: impl AsRef<str>,
        params: impl IntoIterator<Item = FragmentParam>,
        body: F,
    ) -> Self
    where
        F: Fn(&mut Scope, &FragmentArgs) -> FilterResult<()> + Send + Sync + 'static,
    {
        Self {
            name: SmolStr::new(name.as_ref()),
            params: params.into_iter().collect(),
            body: Arc::new(body),
        }
    }

    /// The fragment name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters.
    pub fn params(&self) -> &[FragmentParam] {
        &self.params
    }

    /// Check call-time arguments against the declared parameters.
    pub fn check_args(&self, args: &FragmentArgs) -> FilterResult<()> {
        if args.len() != self.params.len() {
            return Err(FilterError::argument_mismatch(
                self.name.as_str(),
                format!("expected {} argument(s), got {}", self.params.len(), args.len()),
            ));
        }

        for (param, value) in self.params.iter().zip(args.iter()) {
            if !param.kind.accepts(value) {
                return Err(FilterError::argument_mismatch(
                    self.name.as_str(),
                    format!("{} expects {:?} but got {}", param.name, param.kind, value.kind()),
                ));
            }
        }

        Ok(())
    }

    /// Check the arguments and run the body against `scope`.
    pub fn apply(&self, scope: &mut Scope, args: &FragmentArgs) -> FilterResult<()> {
        self.check_args(args)?;
        (self.body)(scope, args).map_err(|e| {
            if e.context.fragment.is_none() {
                e.with_fragment(self.name.as_str())
            } else {
                e
            }
        })
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
