use std::rc::Rc;

use treetrace_core::model::{ActionRecord, SourceLocation, TrackerMessage};
use treetrace_protocol::Transport;

/// Fans provenance events out to the transport.
///
/// The broker holds no cross-call state: markers and records go out the
/// moment they happen, and nesting correctness comes entirely from the
/// [`Bracket`] guard held by each interception frame. A consumer rebuilds
/// chunks from the flat stream by counting markers.
pub struct Broker {
    transport: Rc<dyn Transport>,
}

impl Broker {
    pub fn new(transport: Rc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn record_start(&self, loc: &SourceLocation) {
        self.transport
            .send(TrackerMessage::RecordStart { loc: loc.clone() });
    }

    pub fn record_end(&self, loc: &SourceLocation) {
        self.transport
            .send(TrackerMessage::RecordEnd { loc: loc.clone() });
    }

    pub fn emit(&self, record: ActionRecord) {
        tracing::trace!(
            "record {} {}",
            record.track_id,
            record.action_type
        );
        self.transport.send(TrackerMessage::Record(record));
    }

    /// Opens a context bracket. The matching end marker goes out when the
    /// returned guard drops, on every exit path, so arbitrarily deep
    /// re-entrancy nests like balanced parentheses.
    pub fn bracket(&self, loc: SourceLocation) -> Bracket<'_> {
        self.record_start(&loc);
        Bracket { broker: self, loc }
    }
}

#[must_use = "dropping the bracket immediately closes the context"]
pub struct Bracket<'a> {
    broker: &'a Broker,
    loc: SourceLocation,
}

impl Drop for Bracket<'_> {
    fn drop(&mut self) {
        self.broker.record_end(&self.loc);
    }
}
