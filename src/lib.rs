//! xplane_link - Voice Host / X-Plane Dataref Link
//!
//! This crate bridges a voice-command automation host and a running X-Plane
//! process over a persistent local IPC connection. The host reads and writes
//! typed simulator state variables ("datarefs") and fires simulator commands
//! through a line-oriented text protocol with strict one-request-one-reply
//! discipline.
//!
//! Layering, leaves first: [`dataref`] (typed value objects), [`codec`]
//! (wire text encode/decode), [`transport`] (persistent connection state
//! machine), [`link`] (dispatcher with retry and batch correlation),
//! [`host`] (adapter glue toward the hosting application).

use thiserror::Error;

pub mod codec;
pub mod config;
pub mod dataref;
pub mod host;
pub mod link;
pub mod transport;

pub use codec::{CodecError, CommandPhase, CommandReply};
pub use config::LinkConfig;
pub use dataref::{DataRef, DataRefType, DataRefValue};
pub use host::{HostAdapter, InvokeContext};
pub use link::Link;
pub use transport::{ConnectionState, PipeTransport, Transport, TransportError};

/// Default endpoint path for the simulator-side plugin.
///
/// The version segment is part of the endpoint identity; both sides must
/// agree on it since the protocol itself carries no version information.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/xplane_link/xplane_link.v1.sock";

/// Link errors
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("config error: {0}")]
    Config(String),

    #[error("host binding error: {0}")]
    Host(String),
}

/// Result type for link operations
pub type Result<T> = std::result::Result<T, LinkError>;
