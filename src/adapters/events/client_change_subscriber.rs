//! Redis subscription for client lifecycle messages.
//!
//! The subscription service announces client creation, activation,
//! deactivation, modification, and deletion on a pub/sub channel. Each
//! message is parsed into a `ClientChangeCommand` and handed to
//! `HandleClientChangeHandler`. Messages that cannot be parsed or handled
//! are logged and dropped; pub/sub has no redelivery.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::application::handlers::client::{ClientChangeCommand, HandleClientChangeHandler};
use crate::domain::foundation::{DomainError, ErrorCode};

/// Outcome of one message, mainly for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Handled,
    Rejected,
}

pub struct ClientChangeSubscriber {
    handler: Arc<HandleClientChangeHandler>,
    channel: String,
}

impl ClientChangeSubscriber {
    pub fn new(handler: Arc<HandleClientChangeHandler>, channel: impl Into<String>) -> Self {
        Self {
            handler,
            channel: channel.into(),
        }
    }

    /// Parses and handles one message body.
    pub async fn dispatch(&self, payload: &str) -> Dispatch {
        let cmd: ClientChangeCommand = match serde_json::from_str(payload) {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!(error = %e, channel = %self.channel, "Rejecting unparsable client change message");
                return Dispatch::Rejected;
            }
        };
        let client_id = cmd.client_id;
        match self.handler.handle(cmd).await {
            Ok(()) => Dispatch::Handled,
            Err(e) => {
                error!(client_id = %client_id, error = %e, "Rejecting client change message");
                Dispatch::Rejected
            }
        }
    }

    /// Listens until `shutdown` turns true or the connection drops.
    pub async fn run(
        &self,
        client: redis::Client,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), DomainError> {
        let mut pubsub = client
            .get_async_connection()
            .await
            .map_err(|e| DomainError::new(ErrorCode::CacheError, e.to_string()))?
            .into_pubsub();
        pubsub
            .subscribe(&self.channel)
            .await
            .map_err(|e| DomainError::new(ErrorCode::CacheError, e.to_string()))?;
        info!(channel = %self.channel, "Subscribed to client changes");

        let mut messages = pubsub.on_message();
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Client change subscriber stopped");
                        return Ok(());
                    }
                }
                message = messages.next() => {
                    let Some(message) = message else {
                        return Err(DomainError::new(
                            ErrorCode::CacheError,
                            "Client change subscription closed",
                        ));
                    };
                    match message.get_payload::<String>() {
                        Ok(payload) => {
                            let outcome = self.dispatch(&payload).await;
                            debug!(?outcome, "Client change message processed");
                        }
                        Err(e) => warn!(error = %e, "Rejecting non-text client change message"),
                    }
                }
            }
        }
    }
}
