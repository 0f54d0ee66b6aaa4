use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::content::Content;

/// Attribute mapping attached to items and layouts
pub type Attributes = IndexMap<String, serde_json::Value>;

/// Unique, path-like identifier of an item or layout (e.g. `/about.md`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(identifier: impl Into<String>) -> Self {
        Identifier(identifier.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(identifier: &str) -> Self {
        Identifier::new(identifier)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Symbolic snapshot key scoped to a representation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotName(String);

impl SnapshotName {
    pub const LAST: &'static str = "last";

    pub fn new(name: impl Into<String>) -> Self {
        SnapshotName(name.into())
    }

    /// The snapshot holding the most recent content of a representation
    pub fn last() -> Self {
        SnapshotName::new(Self::LAST)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SnapshotName {
    fn from(name: &str) -> Self {
        SnapshotName::new(name)
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A source content unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    identifier: Identifier,
    content: Content,
    attributes: Attributes,
}

impl Item {
    pub fn new(
        content: impl Into<Content>,
        attributes: Attributes,
        identifier: impl Into<Identifier>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            content: content.into(),
            attributes,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// A template that wraps the content of a representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    identifier: Identifier,
    content: Content,
    attributes: Attributes,
}

impl Layout {
    pub fn new(
        content: impl Into<Content>,
        attributes: Attributes,
        identifier: impl Into<Identifier>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            content: content.into(),
            attributes,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// Stable identity of a representation: (item identifier, rep name)
///
/// Used as the key of both the snapshot repo and the compiled content cache,
/// so it must not depend on anything that changes between runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepIdentity {
    pub item: Identifier,
    pub rep: String,
}

impl RepIdentity {
    pub fn new(item: impl Into<Identifier>, rep: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            rep: rep.into(),
        }
    }
}

impl fmt::Display for RepIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (rep {})", self.item, self.rep)
    }
}

/// A named compile target derived from an item
#[derive(Debug)]
pub struct ItemRep {
    item: Arc<Item>,
    identity: RepIdentity,
    compiled: AtomicBool,
}

impl ItemRep {
    pub fn new(item: Arc<Item>, name: impl Into<String>) -> Self {
        let identity = RepIdentity::new(item.identifier().clone(), name);
        Self {
            item,
            identity,
            compiled: AtomicBool::new(false),
        }
    }

    pub fn item(&self) -> &Arc<Item> {
        &self.item
    }

    pub fn name(&self) -> &str {
        &self.identity.rep
    }

    pub fn identity(&self) -> &RepIdentity {
        &self.identity
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.load(Ordering::Acquire)
    }

    /// Flag the representation as compiled
    ///
    /// Returns `true` only for the call that flipped the flag; later calls are no-ops.
    pub fn mark_compiled(&self) -> bool {
        !self.compiled.swap(true, Ordering::AcqRel)
    }
}

/// The items and layouts of one build run
#[derive(Debug, Default, Clone)]
pub struct Site {
    items: IndexMap<Identifier, Arc<Item>>,
    layouts: IndexMap<Identifier, Arc<Layout>>,
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.add_item(item);
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.add_layout(layout);
        self
    }

    /// Add an item, returning the shared handle reps should be built from
    pub fn add_item(&mut self, item: Item) -> Arc<Item> {
        let item = Arc::new(item);
        self.items.insert(item.identifier().clone(), item.clone());
        item
    }

    pub fn add_layout(&mut self, layout: Layout) -> Arc<Layout> {
        let layout = Arc::new(layout);
        self.layouts.insert(layout.identifier().clone(), layout.clone());
        layout
    }

    pub fn item(&self, identifier: &Identifier) -> Option<&Arc<Item>> {
        self.items.get(identifier)
    }

    pub fn layout(&self, identifier: &Identifier) -> Option<&Arc<Layout>> {
        self.layouts.get(identifier)
    }

    pub fn contains_item(&self, identifier: &Identifier) -> bool {
        self.items.contains_key(identifier)
    }

    pub fn items(&self) -> impl Iterator<Item = &Arc<Item>> {
        self.items.values()
    }
}
