pub mod error;
pub mod stream;
pub mod transport;

pub use error::ProtocolError;
pub use stream::{chunks, from_jsonl, is_balanced, to_jsonl};
pub use transport::{ChannelTransport, JsonLinesTransport, MemoryTransport, Transport};
