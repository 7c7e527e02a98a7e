//! The expression tree built by the DSL.
//!
//! A filter is a root [`Group`] combining its children with AND. Children are
//! restrictions, nested groups, or join scopes whose bodies are themselves
//! AND groups evaluated against the joined table.

use smol_str::SmolStr;

use crate::join::JoinKind;
use crate::restriction::Restriction;

/// How a group combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Conjunction.
    All,
    /// Disjunction.
    Any,
}

impl Combinator {
    /// The SQL separator between parts.
    pub fn separator(&self) -> &'static str {
        match self {
            Self::All => " AND ",
            Self::Any => " OR ",
        }
    }
}

/// A node in the expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A single-column predicate.
    Restriction(Restriction),
    /// A nested conjunction or disjunction.
    Group(Group),
    /// Entry into a related collection.
    Join(JoinScope),
}

/// A conjunction or disjunction over child nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    combinator: Combinator,
    negated: bool,
    children: Vec<Node>,
}

impl Group {
    /// Create an empty group.
    pub fn new(combinator: Combinator, negated: bool) -> Self {
        Self {
            combinator,
            negated,
            children: Vec::new(),
        }
    }

    /// An empty, non-negated conjunction.
    pub fn all() -> Self {
        Self::new(Combinator::All, false)
    }

    /// The combinator.
    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    /// Whether the rendered group is wrapped in `NOT (...)`.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Check if the group has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Append a restriction and hand it back for operator calls.
    pub fn add_restriction(&mut self, restriction: Restriction) -> &mut Restriction {
        let index = self.children.len();
        self.children.push(Node::Restriction(restriction));
        match &mut self.children[index] {
            Node::Restriction(restriction) => restriction,
            _ => unreachable!("a restriction was pushed at this index"),
        }
    }

    /// Append a nested AND group.
    pub fn add_all_of(&mut self, group: Group) {
        debug_assert_eq!(group.combinator, Combinator::All);
        self.children.push(Node::Group(group));
    }

    /// Append a nested OR group.
    pub fn add_any_of(&mut self, group: Group) {
        debug_assert_eq!(group.combinator, Combinator::Any);
        self.children.push(Node::Group(group));
    }

    /// Append a join scope.
    pub fn add_join(&mut self, join: JoinScope) {
        self.children.push(Node::Join(join));
    }
}

/// Entry into a related collection.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinScope {
    relation: SmolStr,
    kind: JoinKind,
    body: Group,
}

impl JoinScope {
    /// Create a join scope over the named association.
    pub fn new(relation: impl AsRef<str>, kind: JoinKind, body: Group) -> Self {
        Self {
            relation: SmolStr::new(relation.as_ref()),
            kind,
            body,
        }
    }

    /// The association name on the enclosing type.
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Inner or left outer.
    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    /// Conditions evaluated against the joined table.
    pub fn body(&self) -> &Group {
        &self.body
    }
}
