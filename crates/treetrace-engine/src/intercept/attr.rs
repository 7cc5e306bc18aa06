use std::rc::Rc;

use treetrace_core::tree::{Attr, Element, TargetKind};

use super::Shared;
use crate::location;

/// Tracked handle over an [`Attr`] node. A detached node mutated through
/// this handle gets anchored to a shadow placeholder first, so the mutation
/// still receives identity and provenance.
pub struct TrackedAttr {
    raw: Attr,
    shared: Rc<Shared>,
}

impl TrackedAttr {
    pub(crate) fn new(raw: Attr, shared: Rc<Shared>) -> Self {
        Self { raw, shared }
    }

    pub fn raw(&self) -> &Attr {
        &self.raw
    }

    pub fn name(&self) -> String {
        self.raw.name()
    }

    pub fn value(&self) -> String {
        self.raw.value()
    }

    pub fn namespace_uri(&self) -> Option<String> {
        self.raw.namespace_uri()
    }

    pub fn owner_element(&self) -> Option<Element> {
        self.raw.owner_element()
    }

    #[track_caller]
    pub fn set_value(&self, value: &str) {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            if !self.shared.owners.has_owner(&self.raw) {
                self.shared.anchor_attr(&self.raw);
            }
            self.raw.set_value(value);
            self.shared
                .record(&self.raw, TargetKind::Attr, "set_value", None);
        })
    }
}

impl std::fmt::Debug for TrackedAttr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedAttr")
            .field("name", &self.raw.name())
            .field("value", &self.raw.value())
            .finish()
    }
}
