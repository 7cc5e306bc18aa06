use std::cell::RefCell;
use std::io::Write;
use std::sync::mpsc;

use treetrace_core::model::TrackerMessage;

/// Delivery primitive consumed by the instrumentation engine.
///
/// Fire-and-forget: the engine never waits for acknowledgment, and a failed
/// delivery must not fail the intercepted call.
pub trait Transport {
    fn send(&self, message: TrackerMessage);
}

/// Collects messages in memory. The default choice for tests and for
/// consumers that reconstruct chunks in-process.
#[derive(Default)]
pub struct MemoryTransport {
    messages: RefCell<Vec<TrackerMessage>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<TrackerMessage> {
        self.messages.borrow().clone()
    }

    pub fn take(&self) -> Vec<TrackerMessage> {
        self.messages.take()
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }
}

impl Transport for MemoryTransport {
    fn send(&self, message: TrackerMessage) {
        self.messages.borrow_mut().push(message);
    }
}

/// Hands messages to an `mpsc` channel, e.g. for a consumer thread.
pub struct ChannelTransport {
    sender: mpsc::Sender<TrackerMessage>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::Receiver<TrackerMessage>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, message: TrackerMessage) {
        if self.sender.send(message).is_err() {
            tracing::debug!("dropping message, receiver is gone");
        }
    }
}

/// Writes one JSON object per line, the stream format the consumer tooling
/// reads back.
pub struct JsonLinesTransport<W: Write> {
    writer: RefCell<W>,
}

impl<W: Write> JsonLinesTransport<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: RefCell::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write> Transport for JsonLinesTransport<W> {
    fn send(&self, message: TrackerMessage) {
        let mut writer = self.writer.borrow_mut();
        let wrote = serde_json::to_writer(&mut *writer, &message)
            .map_err(std::io::Error::from)
            .and_then(|()| writer.write_all(b"\n"));
        if let Err(e) = wrote {
            tracing::warn!("dropping message, write failed: {e}");
        }
    }
}
