//! Transition labels: method references and the unknown placeholder.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Name used for constructors in method signatures.
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// A reference to one API method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodRef {
    /// Declaring type, e.g. `java.io.File`.
    pub owner: String,
    /// Simple name, `<init>` for constructors.
    pub name: String,
    /// Parameter/return descriptor, e.g. `(Ljava/lang/String;)V`.
    pub descriptor: String,
    pub is_static: bool,
    pub is_constructor: bool,
}

impl MethodRef {
    /// An instance method.
    pub fn new(owner: impl Into<String>, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
            is_static: false,
            is_constructor: false,
        }
    }

    /// A static method.
    pub fn static_method(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            is_static: true,
            ..Self::new(owner, name, descriptor)
        }
    }

    /// A constructor of `owner`.
    pub fn constructor(owner: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            is_constructor: true,
            ..Self::new(owner, CONSTRUCTOR_NAME, descriptor)
        }
    }

    /// Bare method name; overloads and overrides share it.
    pub fn short_name(&self) -> &str {
        &self.name
    }

    /// Fully qualified signature.
    pub fn signature(&self) -> String {
        format!("{}.{}{}", self.owner, self.name, self.descriptor)
    }
}

/// A transition label.
///
/// `Unknown` stands for an unobserved stretch of execution, usually because
/// the tracked object escaped into code the miner cannot see.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Unknown,
    Method(Arc<MethodRef>),
}

impl Label {
    pub fn method(method: MethodRef) -> Self {
        Self::Method(Arc::new(method))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn as_method(&self) -> Option<&MethodRef> {
        match self {
            Self::Method(m) => Some(m),
            Self::Unknown => None,
        }
    }

    pub fn is_static(&self) -> bool {
        self.as_method().is_some_and(|m| m.is_static)
    }

    pub fn is_constructor(&self) -> bool {
        self.as_method().is_some_and(|m| m.is_constructor)
    }

    /// Declaring type of a concrete label.
    pub fn owner(&self) -> Option<&str> {
        self.as_method().map(|m| m.owner.as_str())
    }

    /// Whether two labels denote the same call for node-matching purposes.
    ///
    /// Static-ness must agree. Constructors and unknowns are compared by full
    /// signature; every other method by short name, so calls recorded against
    /// a supertype or a placeholder owner still line up.
    pub fn matches(&self, other: &Label) -> bool {
        if self.is_static() != other.is_static() {
            return false;
        }
        match (self, other) {
            (Self::Unknown, Self::Unknown) => true,
            (Self::Unknown, _) | (_, Self::Unknown) => false,
            (Self::Method(a), Self::Method(b)) => {
                if a.is_constructor || b.is_constructor {
                    a.is_constructor == b.is_constructor
                        && a.owner == b.owner
                        && a.name == b.name
                        && a.descriptor == b.descriptor
                } else {
                    a.short_name() == b.short_name()
                }
            }
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("?"),
            Self::Method(m) => f.write_str(&m.signature()),
        }
    }
}

/// The set of labels carried by one transition.
///
/// A well-formed set is non-empty and either entirely unknown or entirely
/// concrete; `History::validate` enforces this.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(BTreeSet<Label>);

impl LabelSet {
    pub const EMPTY: LabelSet = LabelSet(BTreeSet::new());

    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// The single-label unknown set.
    pub fn unknown() -> Self {
        Self::single(Label::Unknown)
    }

    pub fn single(label: Label) -> Self {
        let mut set = BTreeSet::new();
        set.insert(label);
        Self(set)
    }

    pub fn method(method: MethodRef) -> Self {
        Self::single(Label::method(method))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.0.iter()
    }

    pub fn insert(&mut self, label: Label) -> bool {
        self.0.insert(label)
    }

    pub fn extend_from(&mut self, other: &LabelSet) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Non-empty and made only of unknown labels.
    pub fn is_unknown(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(Label::is_unknown)
    }

    pub fn has_unknown(&self) -> bool {
        self.0.contains(&Label::Unknown)
    }

    /// Contains both unknown and concrete labels.
    pub fn is_mixed(&self) -> bool {
        self.has_unknown() && self.0.iter().any(|l| !l.is_unknown())
    }

    pub fn has_constructor(&self) -> bool {
        self.0.iter().any(Label::is_constructor)
    }

    /// Every label of `other` has a matching partner here.
    pub fn covers(&self, other: &LabelSet) -> bool {
        other
            .0
            .iter()
            .all(|b| self.0.iter().any(|a| a.matches(b)))
    }

    /// Set-level label matching: both empty, or both non-empty and every
    /// label on either side has a matching partner on the other.
    ///
    /// Pairing is per partner rather than all-pairs: after a join an edge can
    /// carry `{read, write}`, and under all-pairs that set could never match
    /// even an identical copy of itself.
    pub fn matches(&self, other: &LabelSet) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.is_empty() && other.is_empty();
        }
        self.covers(other) && other.covers(self)
    }

    /// At least one pair of labels matches.
    pub fn overlaps(&self, other: &LabelSet) -> bool {
        self.0
            .iter()
            .any(|a| other.0.iter().any(|b| a.matches(b)))
    }

    /// Exact set inclusion.
    pub fn is_superset(&self, other: &LabelSet) -> bool {
        self.0.is_superset(&other.0)
    }

    pub fn as_set(&self) -> &BTreeSet<Label> {
        &self.0
    }
}

impl FromIterator<Label> for LabelSet {
    fn from_iter<I: IntoIterator<Item = Label>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = &'a Label;
    type IntoIter = std::collections::btree_set::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{label}")?;
        }
        f.write_str("}")
    }
}
