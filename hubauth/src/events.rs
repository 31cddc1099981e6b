//! Notifications published by an authentication provider

use tokio::sync::broadcast;

use crate::{error::RenewalFailure, DeviceCredentials};

/// Number of events retained for a subscriber that has not yet received them
pub(crate) const EVENT_CAPACITY: usize = 16;

/// An event published to subscribers of an authentication provider
#[derive(Clone, Debug)]
pub enum AuthenticationEvent {
    /// A new token was signed
    ///
    /// Transports should re-authenticate using these credentials.
    NewTokenAvailable(DeviceCredentials),

    /// A scheduled renewal failed
    ///
    /// No further renewal is scheduled; the next call to
    /// [`get_device_credentials`][crate::SharedAccessKeyAuthenticationProvider::get_device_credentials]
    /// will try again.
    RenewalFailed(RenewalFailure),
}

impl AuthenticationEvent {
    /// The credentials carried by the event, if a new token is available
    pub fn credentials(&self) -> Option<&DeviceCredentials> {
        match self {
            Self::NewTokenAvailable(creds) => Some(creds),
            Self::RenewalFailed(_) => None,
        }
    }
}

/// A subscription to the events of an authentication provider
///
/// Only events published after subscribing are received.
pub type AuthenticationEvents = broadcast::Receiver<AuthenticationEvent>;

#[derive(Debug)]
pub(crate) struct Publisher {
    tx: broadcast::Sender<AuthenticationEvent>,
}

impl Publisher {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> AuthenticationEvents {
        self.tx.subscribe()
    }

    pub(crate) fn publish(&self, event: AuthenticationEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("no subscribers listening for authentication events");
        }
    }
}
