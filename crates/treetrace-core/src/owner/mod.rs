pub mod table;

pub use table::OwnerTable;

use crate::model::{TrackId, TrackIdSource};
use crate::tree::Element;

/// Attribute under which an owner's id is persisted on its node, so
/// identity survives independently of any side table.
pub const TRACK_ID_ATTR: &str = "trackid";

/// The logical entity a tracked mutation is attributed to.
///
/// `Null` is the sentinel for objects the engine declines to track: it
/// carries no id and never matches a lookup.
#[derive(Debug, Clone)]
pub enum Owner {
    Real(Element),
    Null,
}

impl Owner {
    pub fn real(element: Element) -> Self {
        Owner::Real(element)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Owner::Null)
    }

    pub fn element(&self) -> Option<&Element> {
        match self {
            Owner::Real(element) => Some(element),
            Owner::Null => None,
        }
    }

    /// Whether this owner is a placeholder anchoring detached objects.
    /// The check is structural (reserved tag), not type identity.
    pub fn is_shadow(&self) -> bool {
        matches!(self, Owner::Real(element) if element.is_shadow_anchor())
    }

    pub fn track_id(&self) -> Option<TrackId> {
        self.element()?
            .get_attribute(TRACK_ID_ATTR)
            .filter(|id| !id.is_empty())
            .map(TrackId::from)
    }

    pub fn has_track_id(&self) -> bool {
        self.track_id().is_some()
    }

    /// Assigns a freshly minted id, only if none is set yet.
    /// Returns whether the assignment happened.
    pub fn set_track_id(&self, ids: &TrackIdSource) -> bool {
        if self.has_track_id() {
            return false;
        }
        match self {
            Owner::Real(element) => {
                element.set_attribute(TRACK_ID_ATTR, ids.mint().as_str());
                true
            }
            Owner::Null => false,
        }
    }
}
