//! The chat-facing edge: turning text into requests and outcomes into
//! replies and records. Transport is left to the binary.

mod command;
mod input;
mod record;
mod reply;

pub use command::Command;
pub use input::spawn_line_reader;
pub use record::{KeypairRecord, RecordError};
pub use reply::Reply;
