pub mod attr;
pub mod element;
pub mod satellite;

pub use attr::Attr;
pub use element::{Element, SHADOW_ANCHOR_TAG};
pub use satellite::{AttrMap, Dataset, StyleView, TokenList};

use std::any::Any;
use std::rc::Weak;

/// The kinds of objects whose mutations can be tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Element,
    Attr,
    AttrMap,
    StyleView,
    TokenList,
    Dataset,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Element => "Element",
            TargetKind::Attr => "Attr",
            TargetKind::AttrMap => "AttrMap",
            TargetKind::StyleView => "StyleView",
            TargetKind::TokenList => "TokenList",
            TargetKind::Dataset => "Dataset",
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An object whose mutations can be attributed to an owner.
///
/// Identity is by reference: `track_key` is the address of the shared
/// allocation behind the handle, and `probe` is a weak handle to the same
/// allocation so a side table can tell a live key from a recycled address
/// without extending the object's lifetime.
pub trait Trackable {
    fn kind(&self) -> TargetKind;

    fn track_key(&self) -> usize;

    fn probe(&self) -> Weak<dyn Any>;

    fn as_any(&self) -> &dyn Any;
}
