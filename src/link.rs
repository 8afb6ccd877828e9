//! Command dispatcher
//!
//! [`Link`] is the public operation surface: get/set dataref and the command
//! lifecycle operations, built on a [`Transport`] plus the wire codec. Each
//! call owns the transport for one full write-then-read cycle; the protocol
//! has no request identifiers, so no two requests may ever be in flight on
//! the same connection.
//!
//! Retries exist only for transport flakiness. A semantic rejection from the
//! simulator (a non-`{ok}` sentinel on an intact channel) is final and never
//! retried.

use crate::codec::{self, CommandPhase, CommandReply};
use crate::config::LinkConfig;
use crate::dataref::DataRef;
use crate::transport::{PipeTransport, Transport};
use crate::{CodecError, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Dispatcher for dataref and command requests toward the simulator.
pub struct Link<T: Transport> {
    transport: T,
    config: LinkConfig,
}

impl Link<PipeTransport> {
    /// Build a link over the production socket transport.
    pub fn new(config: LinkConfig) -> Self {
        let transport = PipeTransport::new(
            &config.socket_path,
            Duration::from_millis(config.connect_timeout_ms),
        );
        Self { transport, config }
    }
}

impl<T: Transport> Link<T> {
    /// Build a link over an injected transport. Used by tests to script
    /// transport failures without a running simulator.
    pub fn with_transport(transport: T, config: LinkConfig) -> Self {
        Self { transport, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Read one dataref.
    ///
    /// `Ok(None)` means the simulator does not know the variable - a valid
    /// outcome, distinct from a decode or transport failure.
    pub async fn get_dataref(&mut self, name: &str) -> Result<Option<DataRef>> {
        self.transport.ensure_connected().await?;

        debug!(dataref = name, "getting dataref");
        let reply = self
            .transport
            .send_and_receive(&codec::encode_get(name))
            .await?;

        if reply == codec::SENTINEL_INVALID_DATAREF {
            debug!(dataref = name, "dataref unknown to the simulator");
            return Ok(None);
        }

        match codec::decode_dataref(name, &reply) {
            Ok(dataref) => {
                debug!(dataref = name, value = %dataref.value(), "got dataref");
                Ok(Some(dataref))
            }
            Err(e @ CodecError::NameMismatch { .. }) => {
                // The reply stream answered some other request; whatever is
                // buffered on the channel can no longer be attributed, so the
                // next call must start from a fresh connection.
                warn!(dataref = name, error = %e, "reply stream desynchronized, dropping connection");
                self.transport.disconnect().await;
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write one dataref.
    ///
    /// `Ok(false)` is a semantic rejection by the simulator and is never
    /// retried. Transport failures trigger a reconnect-and-resend, bounded
    /// by `LinkConfig::send_attempts` total attempts.
    pub async fn set_dataref(&mut self, dataref: &DataRef) -> Result<bool> {
        let request = codec::encode_set(dataref);
        let attempts = self.config.send_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.transport.ensure_connected().await?;

            debug!(dataref = dataref.name(), value = %dataref.value(), attempt, "setting dataref");
            match self.transport.send_and_receive(&request).await {
                Ok(reply) => {
                    if reply == codec::SENTINEL_OK {
                        info!(dataref = dataref.name(), "dataref set");
                        return Ok(true);
                    }
                    warn!(dataref = dataref.name(), reply = %reply, "set rejected by simulator");
                    return Ok(false);
                }
                Err(e) => {
                    if attempt >= attempts {
                        return Err(e.into());
                    }
                    warn!(
                        dataref = dataref.name(),
                        attempt,
                        attempts,
                        error = %e,
                        "pipe broken, reconnecting and retrying"
                    );
                    self.transport.disconnect().await;
                }
            }
        }
    }

    /// Start holding one or more `;`-separated commands.
    pub async fn begin_command(&mut self, commands: &str) -> Result<bool> {
        self.command_all_ok(commands, CommandPhase::Begin).await
    }

    /// Release one or more `;`-separated commands.
    pub async fn end_command(&mut self, commands: &str) -> Result<bool> {
        self.command_all_ok(commands, CommandPhase::End).await
    }

    /// Fire one or more `;`-separated commands once.
    pub async fn once_command(&mut self, commands: &str) -> Result<bool> {
        self.command_all_ok(commands, CommandPhase::Once).await
    }

    /// Hold one or more `;`-separated commands active for `duration_ms`.
    pub async fn hold_command(&mut self, commands: &str, duration_ms: u32) -> Result<bool> {
        self.command_all_ok(commands, CommandPhase::Hold { duration_ms })
            .await
    }

    /// Send one batched command request and return the per-position
    /// sentinels, positionally correlated to the `;`-separated input names.
    pub async fn command_batch(
        &mut self,
        commands: &str,
        phase: CommandPhase,
    ) -> Result<Vec<CommandReply>> {
        let names: Vec<&str> = commands.split(';').collect();

        self.transport.ensure_connected().await?;

        let request = codec::encode_command_batch(&names, phase);
        debug!(request = %request, "sending command batch");
        let reply = self.transport.send_and_receive(&request).await?;

        let replies = match codec::split_batch_reply(&reply, names.len()) {
            Ok(replies) => replies,
            Err(e) => {
                // A reply with the wrong arity cannot be correlated; the
                // channel state is unknown, same as a name mismatch.
                warn!(reply = %reply, error = %e, "uncorrelatable command reply, dropping connection");
                self.transport.disconnect().await;
                return Err(e.into());
            }
        };

        for (name, outcome) in names.iter().zip(&replies) {
            match outcome {
                CommandReply::Ok => {}
                CommandReply::InvalidCommand => {
                    warn!(command = *name, "command does not exist in the simulator");
                }
                CommandReply::MissingHoldDuration => {
                    warn!(command = *name, "command was sent without a hold duration");
                }
                CommandReply::Other(token) => {
                    warn!(command = *name, reply = %token, "unexpected command reply");
                }
            }
        }

        Ok(replies)
    }

    async fn command_all_ok(&mut self, commands: &str, phase: CommandPhase) -> Result<bool> {
        let replies = self.command_batch(commands, phase).await?;
        Ok(replies.iter().all(|reply| *reply == CommandReply::Ok))
    }
}
