use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::item::{Identifier, ItemRep, RepIdentity, SnapshotName};

/// Parameters passed to a filter or layout
pub type Params = serde_json::Map<String, serde_json::Value>;

/// One step in a representation's compilation plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcessingAction {
    Filter {
        name: String,
        #[serde(default)]
        params: Params,
    },
    Layout {
        identifier: Identifier,
        #[serde(default)]
        params: Params,
    },
    Snapshot {
        name: SnapshotName,
    },
    /// An action kind this build does not know how to execute
    #[serde(other)]
    Unrecognized,
}

impl ProcessingAction {
    pub fn filter(name: impl Into<String>) -> Self {
        ProcessingAction::Filter {
            name: name.into(),
            params: Params::new(),
        }
    }

    pub fn layout(identifier: impl Into<Identifier>) -> Self {
        ProcessingAction::Layout {
            identifier: identifier.into(),
            params: Params::new(),
        }
    }

    pub fn snapshot(name: impl Into<SnapshotName>) -> Self {
        ProcessingAction::Snapshot { name: name.into() }
    }
}

impl fmt::Display for ProcessingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingAction::Filter { name, .. } => write!(f, "filter {}", name),
            ProcessingAction::Layout { identifier, .. } => write!(f, "layout {}", identifier),
            ProcessingAction::Snapshot { name } => write!(f, "snapshot {}", name),
            ProcessingAction::Unrecognized => f.write_str("unrecognized action"),
        }
    }
}

/// Supplies the ordered action list for a representation
///
/// The sequence must stay the same for the whole run as long as the rules
/// it was derived from are unchanged.
pub trait ActionProvider: Send + Sync {
    fn memory_for(&self, rep: &ItemRep) -> Vec<ProcessingAction>;
}

/// Action provider backed by a fixed table of action sequences
///
/// Representations without an entry get an empty sequence.
#[derive(Debug, Default, Clone)]
pub struct StaticActionProvider {
    sequences: FxHashMap<RepIdentity, Vec<ProcessingAction>>,
}

impl StaticActionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sequence(mut self, rep: RepIdentity, actions: Vec<ProcessingAction>) -> Self {
        self.sequences.insert(rep, actions);
        self
    }

    pub fn insert(&mut self, rep: RepIdentity, actions: Vec<ProcessingAction>) {
        self.sequences.insert(rep, actions);
    }

    /// Parse an action sequence from its JSON form
    ///
    /// Unknown action types are kept as [`ProcessingAction::Unrecognized`]
    /// so that the failure surfaces when the representation is compiled.
    pub fn parse_sequence(json: &str) -> serde_json::Result<Vec<ProcessingAction>> {
        serde_json::from_str(json)
    }
}

impl ActionProvider for StaticActionProvider {
    fn memory_for(&self, rep: &ItemRep) -> Vec<ProcessingAction> {
        self.sequences
            .get(rep.identity())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Attributes, Item};
    use std::sync::Arc;

    #[test]
    fn test_parse_sequence() {
        let json = r#"[
            { "type": "filter", "name": "upcase" },
            { "type": "layout", "identifier": "/default.html", "params": { "lang": "en" } },
            { "type": "snapshot", "name": "post" }
        ]"#;

        let actions = StaticActionProvider::parse_sequence(json).unwrap();

        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0], ProcessingAction::filter("upcase"));
        match &actions[1] {
            ProcessingAction::Layout { identifier, params } => {
                assert_eq!(identifier.as_str(), "/default.html");
                assert_eq!(params["lang"], "en");
            }
            other => panic!("expected layout, got {:?}", other),
        }
        assert_eq!(actions[2], ProcessingAction::snapshot("post"));
    }

    #[test]
    fn test_unknown_action_type_is_unrecognized() {
        let json = r#"[{ "type": "teleport", "destination": "/elsewhere" }]"#;

        let actions = StaticActionProvider::parse_sequence(json).unwrap();

        assert_eq!(actions, vec![ProcessingAction::Unrecognized]);
    }

    #[test]
    fn test_missing_sequence_is_empty() {
        let item = Arc::new(Item::new("x", Attributes::new(), "/x.md"));
        let rep = ItemRep::new(item, "default");
        let provider = StaticActionProvider::new().with_sequence(
            RepIdentity::new("/x.md", "other"),
            vec![ProcessingAction::filter("upcase")],
        );

        assert!(provider.memory_for(&rep).is_empty());
    }
}
