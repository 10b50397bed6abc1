//! One loopback device fed by one capture stream.

mod errors;
mod handler;
mod types;

pub use errors::SessionError;
pub use types::{StreamSession, StreamSettings, StreamSource};
