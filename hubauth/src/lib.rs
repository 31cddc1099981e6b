//! Shared access key authentication for devices connecting to a message broker
//!
//! A device holds a long-lived shared access key, but authenticates to its hub
//! with short-lived signed tokens derived from that key. This crate keeps such a
//! token current: it signs the first token on construction, renews it in the
//! background before it expires, and tells interested transports whenever a new
//! token is available so they can re-authenticate without dropping their session.
//!
//! # General flow
//!
//! Construct a [`SharedAccessKeyAuthenticationProvider`] from a device connection
//! string inside a tokio runtime. Transports call
//! [`get_device_credentials`][SharedAccessKeyAuthenticationProvider::get_device_credentials]
//! when connecting and [`subscribe`][SharedAccessKeyAuthenticationProvider::subscribe]
//! to hear about renewals.
//!
//! ```
//! use hubauth::{AuthenticationEvent, SharedAccessKeyAuthenticationProvider};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = SharedAccessKeyAuthenticationProvider::from_connection_string(
//!     "HostName=hub.example.net;DeviceId=sensor-7;SharedAccessKey=c2VjcmV0",
//!     None,
//!     None,
//! )?;
//!
//! let mut events = provider.subscribe();
//!
//! let credentials = provider.get_device_credentials()?;
//! tracing::info!(
//!     token = format_args!("{:#?}", credentials.shared_access_signature()),
//!     "initial token"
//! );
//!
//! # /* Waits for an hour.
//! while let Ok(event) = events.recv().await {
//!     if let AuthenticationEvent::NewTokenAvailable(credentials) = event {
//!         // re-authenticate the transport
//!     }
//! }
//! # */
//! # Ok(())
//! # }
//! ```
//!
//! # Timing
//!
//! Each token is valid for [`TokenLifetimeConfig::valid_duration`] (one hour by
//! default) and is renewed once only [`TokenLifetimeConfig::renewal_margin`]
//! (fifteen minutes by default) remains. Renewals are scheduled on the runtime
//! that was current when the provider was constructed. Only one renewal is ever
//! pending; renewing early replaces it.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod braids;
mod connection_string;
mod credentials;
pub mod error;
mod events;
mod lifetime;
mod provider;
pub mod signature;

pub use braids::*;
pub use connection_string::ConnectionString;
pub use credentials::{DeviceCredentials, DeviceIdentity};
pub use events::{AuthenticationEvent, AuthenticationEvents};
pub use lifetime::{TokenLifetimeConfig, TokenStatus, TokenWindow};
pub use provider::{
    AuthenticationProvider, AuthenticationType, SharedAccessKeyAuthenticationProvider,
};
