pub mod messages;
pub mod stream;

pub use messages::{ClientMessage, ServerMessage};
pub use stream::{StreamRecord, StreamSummary};
