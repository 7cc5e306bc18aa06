mod attr;
mod element;
mod views;

pub use attr::TrackedAttr;
pub use element::TrackedElement;
pub use views::{DatasetProxy, StyleProxy, TrackedAttrMap, TrackedTokenList};

use std::rc::Rc;

use treetrace_core::model::{ActionRecord, SourceLocation, TrackId, TrackIdSource};
use treetrace_core::owner::OwnerTable;
use treetrace_core::tree::{Attr, AttrMap, Dataset, Element, StyleView, TokenList};
use treetrace_core::tree::{TargetKind, Trackable};
use treetrace_protocol::Transport;

use crate::broker::Broker;
use crate::registry::{ActionMap, Anomalies};
use views::{DatasetProxyCore, ProxyCache, StyleProxyCore};

pub(crate) struct Shared {
    pub(crate) owners: OwnerTable,
    pub(crate) broker: Broker,
    pub(crate) ids: TrackIdSource,
    pub(crate) styles: ProxyCache<StyleProxyCore>,
    pub(crate) datasets: ProxyCache<DatasetProxyCore>,
    anchor_filter: Box<dyn Fn(&Element) -> bool>,
}

impl Shared {
    /// Runs `f` inside a context bracket. The end marker goes out on every
    /// exit path, so nested intercepted calls close inner-first and errors
    /// propagate unchanged after the close.
    pub(crate) fn bracketed<R>(&self, loc: SourceLocation, f: impl FnOnce() -> R) -> R {
        let _bracket = self.broker.bracket(loc);
        f()
    }

    pub(crate) fn record_general(&self, caller: &dyn Trackable, kind: TargetKind, operation: &str) {
        debug_assert!(
            !Anomalies::has(kind, operation),
            "{kind}.{operation} needs bespoke decoration"
        );
        self.record(caller, kind, operation, None);
    }

    /// Resolves the caller's owner and emits one record. A caller without a
    /// usable owner is skipped silently; the surrounding bracket still goes
    /// out.
    pub(crate) fn record(
        &self,
        caller: &dyn Trackable,
        kind: TargetKind,
        operation: &str,
        merge: Option<TrackId>,
    ) {
        if !ActionMap::has(kind, operation) {
            tracing::debug!("{kind}.{operation} is not a tracked operation");
            return;
        }
        let owner = self.owners.get_owner(caller);
        let Some(element) = owner.element() else {
            tracing::debug!("skipping {kind}.{operation}, caller has no owner");
            return;
        };
        if !element.is_shadow_anchor() && !(self.anchor_filter)(element) {
            tracing::debug!("skipping {kind}.{operation}, owner fails the attachment filter");
            return;
        }
        owner.set_track_id(&self.ids);
        let Some(track_id) = owner.track_id() else {
            return;
        };
        self.broker.emit(ActionRecord {
            track_id,
            action_type: ActionMap::action_type(kind, operation),
            merge,
        });
    }

    /// Prepares an attribute node for insertion into a real location. A
    /// shadow-owned node is replaced by a fresh unowned clone and the shadow
    /// owner's id is handed back for the record's `merge` field.
    pub(crate) fn normalize_attr(&self, attr: &Attr) -> (Attr, Option<TrackId>) {
        if self.owners.has_shadow_owner(attr) {
            let merge = self.owners.get_owner(attr).track_id();
            (attr.clone_detached(), merge)
        } else {
            (attr.clone(), None)
        }
    }

    /// Gives a detached attribute node a shadow placeholder owner so it can
    /// receive identity. The node itself keeps its placeholder alive, so
    /// both go away together.
    pub(crate) fn anchor_attr(&self, attr: &Attr) {
        let anchor = Element::shadow_anchor();
        attr.anchor_to(&anchor);
        tracing::debug!("anchored detached attribute '{}' to a shadow node", attr.name());
    }

    fn register_derivers(&self) {
        self.owners.register_deriver(
            TargetKind::Element,
            Box::new(|any| any.downcast_ref::<Element>().cloned()),
        );
        self.owners.register_deriver(
            TargetKind::Attr,
            Box::new(|any| any.downcast_ref::<Attr>().and_then(Attr::owner_element)),
        );
        self.owners.register_deriver(
            TargetKind::AttrMap,
            Box::new(|any| any.downcast_ref::<AttrMap>().and_then(AttrMap::element)),
        );
        self.owners.register_deriver(
            TargetKind::StyleView,
            Box::new(|any| any.downcast_ref::<StyleView>().and_then(StyleView::element)),
        );
        self.owners.register_deriver(
            TargetKind::TokenList,
            Box::new(|any| any.downcast_ref::<TokenList>().and_then(TokenList::element)),
        );
        self.owners.register_deriver(
            TargetKind::Dataset,
            Box::new(|any| any.downcast_ref::<Dataset>().and_then(Dataset::element)),
        );
    }
}

/// Builds a [`Tracker`], the composition root where interception is wired
/// up: owner derivation rules are registered here, once, instead of
/// patching anything global.
pub struct TrackerBuilder {
    transport: Rc<dyn Transport>,
    anchor_filter: Box<dyn Fn(&Element) -> bool>,
}

impl TrackerBuilder {
    pub fn new(transport: Rc<dyn Transport>) -> Self {
        Self {
            transport,
            anchor_filter: Box::new(|_| true),
        }
    }

    /// Replaces the tree-attachment predicate deciding whether a resolved
    /// owner element may anchor records. Shadow placeholders always may.
    pub fn anchor_filter(mut self, filter: impl Fn(&Element) -> bool + 'static) -> Self {
        self.anchor_filter = Box::new(filter);
        self
    }

    pub fn build(self) -> Tracker {
        let shared = Rc::new(Shared {
            owners: OwnerTable::new(),
            broker: Broker::new(self.transport),
            ids: TrackIdSource::new(),
            styles: ProxyCache::new(),
            datasets: ProxyCache::new(),
            anchor_filter: self.anchor_filter,
        });
        shared.register_derivers();
        Tracker { shared }
    }
}

/// Hands out tracked handles over tree objects. Mutations through a tracked
/// handle are bracketed, attributed and streamed; mutations on the raw tree
/// are not observed.
pub struct Tracker {
    shared: Rc<Shared>,
}

impl Tracker {
    pub fn new(transport: Rc<dyn Transport>) -> Self {
        TrackerBuilder::new(transport).build()
    }

    pub fn builder(transport: Rc<dyn Transport>) -> TrackerBuilder {
        TrackerBuilder::new(transport)
    }

    pub fn element(&self, raw: Element) -> TrackedElement {
        TrackedElement::new(raw, self.shared.clone())
    }

    pub fn create_element(&self, tag_name: &str) -> TrackedElement {
        self.element(Element::new(tag_name))
    }

    pub fn attr(&self, raw: Attr) -> TrackedAttr {
        TrackedAttr::new(raw, self.shared.clone())
    }

    pub fn create_attr(&self, name: &str, value: &str) -> TrackedAttr {
        self.attr(Attr::new(name, value))
    }

    pub fn owners(&self) -> &OwnerTable {
        &self.shared.owners
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treetrace_core::model::TrackerMessage;
    use treetrace_core::owner::TRACK_ID_ATTR;
    use treetrace_core::CoreError;
    use treetrace_protocol::{chunks, is_balanced, MemoryTransport};

    fn setup() -> (Rc<MemoryTransport>, Tracker) {
        let transport = Rc::new(MemoryTransport::new());
        let tracker = Tracker::new(transport.clone());
        (transport, tracker)
    }

    fn records(messages: &[TrackerMessage]) -> Vec<&treetrace_core::model::ActionRecord> {
        messages.iter().filter_map(TrackerMessage::record).collect()
    }

    #[test]
    fn test_set_attribute_emits_one_bracketed_record() {
        let (transport, tracker) = setup();
        let el = tracker.create_element("div");

        let expected_line = line!() + 1;
        el.set_attribute("x", "1");

        let messages = transport.take();
        assert_eq!(messages.len(), 3);

        let start_loc = messages[0].loc().unwrap();
        assert_eq!(start_loc.file.as_deref(), Some(file!()));
        assert_eq!(start_loc.line, Some(expected_line));
        assert_eq!(messages[2].loc(), Some(start_loc));

        let record = messages[1].record().unwrap();
        assert_eq!(record.track_id.as_str(), "1");
        assert_eq!(record.action_type, "Element.set_attribute");
        assert_eq!(record.merge, None);

        // Identity lands on the node itself.
        assert_eq!(el.get_attribute(TRACK_ID_ATTR), Some("1".into()));
        assert_eq!(el.get_attribute("x"), Some("1".into()));
    }

    #[test]
    fn test_track_id_is_stable_across_mutations() {
        let (transport, tracker) = setup();
        let el = tracker.create_element("div");
        el.set_attribute("a", "1");
        el.set_attribute("b", "2");
        el.set_text("hello");

        let messages = transport.take();
        let records = records(&messages);
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.track_id.as_str() == "1"));
        assert_eq!(records[2].action_type, "Element.set_text");
    }

    #[test]
    fn test_distinct_owners_get_monotonic_ids() {
        let (transport, tracker) = setup();
        tracker.create_element("div").set_attribute("a", "1");
        tracker.create_element("span").set_attribute("b", "2");

        let messages = transport.take();
        let records = records(&messages);
        assert_eq!(records[0].track_id.as_str(), "1");
        assert_eq!(records[1].track_id.as_str(), "2");
    }

    #[test]
    fn test_set_id_nests_brackets_inner_closes_first() {
        let (transport, tracker) = setup();
        let el = tracker.create_element("div");

        let expected_line = line!() + 1;
        el.set_id("app");

        let messages = transport.take();
        assert!(is_balanced(&messages));
        assert_eq!(messages.len(), 6);
        assert!(messages[0].is_start());
        assert!(messages[1].is_start());
        assert_eq!(
            messages[2].record().unwrap().action_type,
            "Element.set_attribute"
        );
        assert!(messages[3].is_end());
        assert_eq!(messages[4].record().unwrap().action_type, "Element.set_id");
        assert!(messages[5].is_end());

        // Both brackets carry the user's call site, not an engine frame.
        for message in &messages {
            if let Some(loc) = message.loc() {
                assert_eq!(loc.line, Some(expected_line));
            }
        }

        assert_eq!(el.id(), Some("app".into()));
        let sliced = chunks(&messages).unwrap();
        assert_eq!(sliced.len(), 1);
    }

    #[test]
    fn test_failed_mutation_closes_bracket_without_record() {
        let (transport, tracker) = setup();
        let parent = tracker.create_element("div");
        let child = tracker.create_element("div");
        parent.append_child(&child).unwrap();
        transport.take();

        let result = child.append_child(&parent);
        assert!(matches!(result, Err(CoreError::Hierarchy(_))));

        let messages = transport.take();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_start());
        assert!(messages[1].is_end());
        assert!(records(&messages).is_empty());
    }

    #[test]
    fn test_rejected_owner_brackets_but_skips_data() {
        let transport = Rc::new(MemoryTransport::new());
        let tracker = Tracker::builder(transport.clone())
            .anchor_filter(|element| element.tag_name() != "orphan")
            .build();

        let el = tracker.create_element("orphan");
        el.set_attribute("x", "1");

        let messages = transport.take();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_start());
        assert!(messages[1].is_end());
        // No identity was minted for the rejected owner.
        assert_eq!(el.get_attribute(TRACK_ID_ATTR), None);

        // The tracked element still mutated.
        assert_eq!(el.get_attribute("x"), Some("1".into()));
    }

    #[test]
    fn test_detached_attr_gets_a_shadow_owner() {
        let (transport, tracker) = setup();
        let attr = tracker.create_attr("title", "");

        attr.set_value("hello");

        let messages = transport.take();
        let records = records(&messages);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action_type, "Attr.set_value");
        assert_eq!(records[0].track_id.as_str(), "1");

        let anchor = attr.owner_element().unwrap();
        assert!(anchor.is_shadow_anchor());
        assert!(tracker.owners().has_shadow_owner(attr.raw()));
        assert_eq!(anchor.get_attribute(TRACK_ID_ATTR), Some("1".into()));
    }

    #[test]
    fn test_shadow_owned_attr_merges_into_real_owner() {
        let (transport, tracker) = setup();
        let attr = tracker.create_attr("title", "");
        attr.set_value("hello");
        let shadow_id = tracker.owners().get_owner(attr.raw()).track_id().unwrap();
        transport.take();

        let el = tracker.create_element("div");
        el.set_attribute_node(&attr).unwrap();

        let messages = transport.take();
        let records = records(&messages);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action_type, "Element.set_attribute_node");
        assert_eq!(records[0].merge.as_ref(), Some(&shadow_id));
        assert_ne!(records[0].track_id, shadow_id);

        // A clone was forwarded; the shadow-owned original stays put.
        let adopted = el.raw().attribute_nodes().into_iter().next().unwrap();
        assert!(!adopted.ptr_eq(attr.raw()));
        assert_eq!(adopted.value(), "hello");
        assert!(attr.owner_element().unwrap().is_shadow_anchor());
    }

    #[test]
    fn test_unowned_attr_is_forwarded_without_merge() {
        let (transport, tracker) = setup();
        let el = tracker.create_element("div");
        let attr = tracker.create_attr("title", "hi");

        el.set_attribute_node(&attr).unwrap();

        let messages = transport.take();
        let records = records(&messages);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].merge, None);
        let adopted = el.raw().attribute_nodes().into_iter().next().unwrap();
        assert!(adopted.ptr_eq(attr.raw()));
    }

    #[test]
    fn test_chunk_reconstruction_over_a_session() {
        let (transport, tracker) = setup();
        let el = tracker.create_element("div");

        el.set_attribute("a", "1");
        el.set_id("app");
        el.class_list().add("active").unwrap();

        let messages = transport.take();
        let sliced = chunks(&messages).unwrap();
        assert_eq!(sliced.len(), 3);
        for chunk in &sliced {
            assert!(is_balanced(chunk));
        }
        assert_eq!(records(sliced[1]).len(), 2);
    }

    #[test]
    fn test_stream_wire_shape() {
        let (transport, tracker) = setup();
        tracker.create_element("div").set_attribute("x", "1");

        let json = serde_json::to_value(transport.take()).unwrap();
        assert_eq!(json[0]["type"], "record_start");
        assert!(json[0]["data"]["loc"]["file"].is_string());
        assert_eq!(json[1]["type"], "record");
        assert_eq!(json[1]["data"]["trackid"], "1");
        assert_eq!(json[1]["data"]["type"], "Element.set_attribute");
        assert!(json[1]["data"].get("merge").is_none());
        assert_eq!(json[2]["type"], "record_end");
    }

    #[test]
    fn test_owner_table_prunes_dead_handles() {
        let (_transport, tracker) = setup();
        {
            let el = tracker.create_element("div");
            el.attributes();
            assert_eq!(tracker.owners().len(), 1);
        }
        assert_eq!(tracker.owners().prune(), 1);
        assert!(tracker.owners().is_empty());
    }

    #[test]
    fn test_shadow_anchor_dies_with_its_attr() {
        let (_transport, tracker) = setup();
        let anchor_probe = {
            let attr = tracker.create_attr("title", "");
            attr.set_value("x");
            let anchor = attr.owner_element().unwrap();
            assert!(anchor.is_shadow_anchor());
            anchor.probe()
        };
        assert_eq!(anchor_probe.strong_count(), 0);
    }
}
