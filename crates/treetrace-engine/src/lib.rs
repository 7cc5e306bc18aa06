//! Instrumentation engine attributing mutations on a live object tree to a
//! stable owner and the call site that triggered them, streamed as
//! bracketed provenance records.
//!
//! # Example
//! ```
//! use std::rc::Rc;
//! use treetrace_engine::Tracker;
//! use treetrace_protocol::{chunks, MemoryTransport};
//!
//! let transport = Rc::new(MemoryTransport::new());
//! let tracker = Tracker::new(transport.clone());
//!
//! let element = tracker.create_element("div");
//! element.set_attribute("data-app", "demo");
//! element.style().set_property("color", "red").unwrap();
//!
//! let messages = transport.take();
//! assert_eq!(chunks(&messages).unwrap().len(), 2);
//! ```

pub mod broker;
pub mod intercept;
pub mod location;
pub mod registry;

pub use broker::{Bracket, Broker};
pub use intercept::{
    DatasetProxy, StyleProxy, TrackedAttr, TrackedAttrMap, TrackedElement, TrackedTokenList,
    Tracker, TrackerBuilder,
};
pub use registry::{ActionMap, Anomalies};

// Re-export the pieces engine users touch directly.
pub use treetrace_core::model::{ActionRecord, SourceLocation, TrackId, TrackerMessage};
pub use treetrace_core::tree::{Attr, Element};
pub use treetrace_core::CoreError;
