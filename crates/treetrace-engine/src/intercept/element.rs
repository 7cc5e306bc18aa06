use std::rc::Rc;

use treetrace_core::model::SourceLocation;
use treetrace_core::tree::{Attr, Element, TargetKind};
use treetrace_core::CoreError;

use super::views::{DatasetProxy, StyleProxy, TrackedAttrMap, TrackedTokenList};
use super::{Shared, TrackedAttr};
use crate::location;

/// Tracked handle over an [`Element`]. Mutating operations bracket, forward
/// to the raw tree, attribute the change and stream one record; reads pass
/// straight through.
pub struct TrackedElement {
    raw: Element,
    shared: Rc<Shared>,
}

impl TrackedElement {
    pub(crate) fn new(raw: Element, shared: Rc<Shared>) -> Self {
        Self { raw, shared }
    }

    pub fn raw(&self) -> &Element {
        &self.raw
    }

    /* reads */

    pub fn tag_name(&self) -> String {
        self.raw.tag_name()
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.raw.get_attribute(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.raw.has_attribute(name)
    }

    pub fn id(&self) -> Option<String> {
        self.raw.get_attribute("id")
    }

    pub fn text(&self) -> String {
        self.raw.text()
    }

    pub fn parent(&self) -> Option<Element> {
        self.raw.parent()
    }

    pub fn children(&self) -> Vec<Element> {
        self.raw.children()
    }

    /* general-decorated mutations */

    #[track_caller]
    pub fn set_attribute(&self, name: &str, value: &str) {
        self.set_attribute_at(location::here(), name, value);
    }

    /// Tracked `set_attribute` with an explicit call site, so compound
    /// operations built on top of it report the user's frame on the nested
    /// bracket too.
    fn set_attribute_at(&self, loc: SourceLocation, name: &str, value: &str) {
        self.shared.bracketed(loc, || {
            self.raw.set_attribute(name, value);
            self.shared
                .record_general(&self.raw, TargetKind::Element, "set_attribute");
        })
    }

    #[track_caller]
    pub fn remove_attribute(&self, name: &str) -> Option<Attr> {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            let removed = self.raw.remove_attribute(name);
            self.shared
                .record_general(&self.raw, TargetKind::Element, "remove_attribute");
            removed
        })
    }

    /// Sets the `id` attribute through the tracked `set_attribute` path, so
    /// one user call yields a nested, balanced pair of brackets.
    #[track_caller]
    pub fn set_id(&self, value: &str) {
        let loc = location::here();
        self.shared.bracketed(loc.clone(), || {
            self.set_attribute_at(loc, "id", value);
            self.shared
                .record_general(&self.raw, TargetKind::Element, "set_id");
        })
    }

    #[track_caller]
    pub fn set_text(&self, text: &str) {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            self.raw.set_text(text);
            self.shared
                .record_general(&self.raw, TargetKind::Element, "set_text");
        })
    }

    #[track_caller]
    pub fn append_child(&self, child: &TrackedElement) -> Result<(), CoreError> {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            self.raw.append_child(&child.raw)?;
            self.shared
                .record_general(&self.raw, TargetKind::Element, "append_child");
            Ok(())
        })
    }

    #[track_caller]
    pub fn insert_before(
        &self,
        child: &TrackedElement,
        reference: Option<&TrackedElement>,
    ) -> Result<(), CoreError> {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            self.raw.insert_before(&child.raw, reference.map(|r| &r.raw))?;
            self.shared
                .record_general(&self.raw, TargetKind::Element, "insert_before");
            Ok(())
        })
    }

    #[track_caller]
    pub fn remove_child(&self, child: &TrackedElement) -> Result<(), CoreError> {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            self.raw.remove_child(&child.raw)?;
            self.shared
                .record_general(&self.raw, TargetKind::Element, "remove_child");
            Ok(())
        })
    }

    /* anomaly-decorated operations */

    /// Adopts an attribute node. A shadow-owned node is forwarded as a
    /// fresh clone and the record carries the shadow owner's id in `merge`,
    /// linking both provenance timelines.
    #[track_caller]
    pub fn set_attribute_node(&self, attr: &TrackedAttr) -> Result<Option<Attr>, CoreError> {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            let (pure, merge) = self.shared.normalize_attr(attr.raw());
            let replaced = self.raw.set_attribute_node(pure)?;
            self.shared
                .record(&self.raw, TargetKind::Element, "set_attribute_node", merge);
            Ok(replaced)
        })
    }

    /// The live attribute collection, with this element registered as its
    /// owner on first access.
    pub fn attributes(&self) -> TrackedAttrMap {
        let raw = self.raw.attribute_map();
        self.shared.owners.set_owner(&raw, &self.raw);
        TrackedAttrMap::new(raw, self.shared.clone())
    }

    /// The live class token list, with this element registered as its owner
    /// on first access.
    pub fn class_list(&self) -> TrackedTokenList {
        let raw = self.raw.class_list();
        self.shared.owners.set_owner(&raw, &self.raw);
        TrackedTokenList::new(raw, self.shared.clone())
    }

    /// Interception wrapper around the live style view, identity-cached per
    /// underlying view.
    pub fn style(&self) -> StyleProxy {
        StyleProxy::obtain(&self.shared, &self.raw)
    }

    /// Interception wrapper around the live dataset view, identity-cached
    /// per underlying view.
    pub fn dataset(&self) -> DatasetProxy {
        DatasetProxy::obtain(&self.shared, &self.raw)
    }
}
