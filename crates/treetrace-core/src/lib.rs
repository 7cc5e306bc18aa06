pub mod error;
pub mod model;
pub mod owner;
pub mod tree;

pub use error::CoreError;
pub use model::{ActionRecord, SourceLocation, TrackId, TrackIdSource, TrackerMessage};
pub use owner::{Owner, OwnerTable, TRACK_ID_ATTR};
pub use tree::{
    Attr, AttrMap, Dataset, Element, StyleView, TargetKind, TokenList, Trackable,
    SHADOW_ANCHOR_TAG,
};
