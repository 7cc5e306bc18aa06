pub mod message;
pub mod track_id;

pub use message::{ActionRecord, SourceLocation, TrackerMessage};
pub use track_id::{TrackId, TrackIdSource};
