//! Test fixtures - sample items, layouts and action sequences

use std::sync::Arc;
use tessera_core::{Attributes, Item, ItemRep, Layout, ProcessingAction, Site};

/// The item most tests compile: `/donkey.md` with raw content "item content"
pub fn donkey_item() -> Item {
    Item::new("item content", Attributes::new(), "/donkey.md")
}

/// A textual item with the given identifier and raw content
pub fn text_item(identifier: &str, content: &str) -> Item {
    Item::new(content, Attributes::new(), identifier)
}

/// Layout wrapping content in a `<body>` element
pub fn default_layout() -> Layout {
    Layout::new("<body>{{ content }}</body>", Attributes::new(), "/default.html")
}

/// A representation named `name` of `item`
pub fn rep(item: &Arc<Item>, name: &str) -> ItemRep {
    ItemRep::new(item.clone(), name)
}

/// Site holding the donkey item and the default layout, plus the donkey handle
pub fn donkey_site() -> (Site, Arc<Item>) {
    let mut site = Site::new().with_layout(default_layout());
    let item = site.add_item(donkey_item());
    (site, item)
}

/// Upcase the content, then record it as the final snapshot
pub fn upcase_then_snapshot() -> Vec<ProcessingAction> {
    vec![
        ProcessingAction::filter("upcase"),
        ProcessingAction::snapshot("last"),
    ]
}
