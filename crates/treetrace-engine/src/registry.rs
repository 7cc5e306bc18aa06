//! Static tables describing which operations are tracked on which kinds.
//!
//! `ActionMap` lists every tracked `(kind, operation)` pair. `Anomalies`
//! lists the subset that cannot use the generic wrap-and-record strategy:
//! getters returning live mutable views, and operations that normalize
//! their argument before forwarding. Generic dispatch must skip anything
//! listed there.

use treetrace_core::tree::TargetKind;

const ACTIONS: &[(TargetKind, &[&str])] = &[
    (
        TargetKind::Element,
        &[
            "set_attribute",
            "remove_attribute",
            "append_child",
            "insert_before",
            "remove_child",
            "set_id",
            "set_text",
            "set_attribute_node",
            "attributes",
            "class_list",
            "style",
            "dataset",
        ],
    ),
    (TargetKind::Attr, &["set_value"]),
    (TargetKind::AttrMap, &["set_named_item", "remove_named_item"]),
    (TargetKind::TokenList, &["add", "remove", "toggle", "replace"]),
    (TargetKind::StyleView, &["set_property", "remove_property"]),
    (TargetKind::Dataset, &["set", "remove"]),
];

const ANOMALIES: &[(TargetKind, &[&str])] = &[
    (
        TargetKind::Element,
        &[
            "set_attribute_node",
            "attributes",
            "class_list",
            "style",
            "dataset",
        ],
    ),
    (TargetKind::Attr, &["set_value"]),
    (TargetKind::AttrMap, &["set_named_item"]),
];

fn table_has(table: &[(TargetKind, &[&str])], kind: TargetKind, operation: &str) -> bool {
    table
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, ops)| ops.contains(&operation))
        .unwrap_or(false)
}

pub struct ActionMap;

impl ActionMap {
    /// Enumerates every trackable kind, for generic installation and for
    /// coverage checks.
    pub fn visit(mut f: impl FnMut(TargetKind)) {
        for (kind, _) in ACTIONS {
            f(*kind);
        }
    }

    pub fn has(kind: TargetKind, operation: &str) -> bool {
        table_has(ACTIONS, kind, operation)
    }

    pub fn operations(kind: TargetKind) -> &'static [&'static str] {
        ACTIONS
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, ops)| *ops)
            .unwrap_or(&[])
    }

    /// Kind-qualified name emitted on the wire, e.g. `Element.set_attribute`.
    pub fn action_type(kind: TargetKind, operation: &str) -> String {
        format!("{}.{}", kind.as_str(), operation)
    }
}

pub struct Anomalies;

impl Anomalies {
    pub fn has(kind: TargetKind, operation: &str) -> bool {
        table_has(ANOMALIES, kind, operation)
    }
}
