//! Common errors

use std::error::Error as StdError;

use hubauth_clock::DurationSecs;
use thiserror::Error;

/// The renewal margin does not leave any time in which a token is fresh
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error(
    "token renewal margin ({}s) must be less than the token validity duration ({}s)",
    .renewal_margin.0,
    .valid_duration.0
)]
pub struct InvalidTokenLifetime {
    valid_duration: DurationSecs,
    renewal_margin: DurationSecs,
}

pub(crate) const fn invalid_token_lifetime(
    valid_duration: DurationSecs,
    renewal_margin: DurationSecs,
) -> InvalidTokenLifetime {
    InvalidTokenLifetime {
        valid_duration,
        renewal_margin,
    }
}

impl InvalidTokenLifetime {
    /// The rejected validity duration
    #[must_use]
    pub fn valid_duration(&self) -> DurationSecs {
        self.valid_duration
    }

    /// The rejected renewal margin
    #[must_use]
    pub fn renewal_margin(&self) -> DurationSecs {
        self.renewal_margin
    }
}

/// A connection string was provided, but it was empty
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("connection string cannot be empty")]
pub struct EmptyConnectionString {
    _p: (),
}

pub(crate) const fn empty_connection_string() -> EmptyConnectionString {
    EmptyConnectionString { _p: () }
}

/// A segment of the connection string is not a `Key=Value` pair
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("connection string segment {segment} is not a key=value pair")]
pub struct MalformedConnectionString {
    segment: usize,
}

pub(crate) const fn malformed_connection_string(segment: usize) -> MalformedConnectionString {
    MalformedConnectionString { segment }
}

/// A required parameter is absent from the connection string
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("connection string is missing the {name} parameter")]
pub struct MissingConnectionParameter {
    name: &'static str,
}

pub(crate) const fn missing_connection_parameter(
    name: &'static str,
) -> MissingConnectionParameter {
    MissingConnectionParameter { name }
}

impl MissingConnectionParameter {
    /// The name of the missing parameter
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// An error occurring while parsing a connection string
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum ConnectionStringError {
    /// The connection string was empty
    #[error(transparent)]
    Empty(#[from] EmptyConnectionString),

    /// A segment could not be split into a key and a value
    #[error(transparent)]
    Malformed(#[from] MalformedConnectionString),

    /// A required parameter is missing
    #[error(transparent)]
    MissingParameter(#[from] MissingConnectionParameter),
}

impl ConnectionStringError {
    /// Whether the error is due to a missing required parameter
    #[must_use]
    pub fn is_missing_parameter(&self) -> bool {
        matches!(self, Self::MissingParameter(_))
    }
}

/// The shared access key is not valid base64
#[derive(Debug, Error)]
#[error("shared access key is not valid base64")]
pub struct InvalidKey {
    #[from]
    source: base64::DecodeError,
}

pub(crate) fn invalid_key(source: base64::DecodeError) -> InvalidKey {
    InvalidKey { source }
}

/// An error occurring while creating a shared access signature
#[derive(Debug, Error)]
pub enum SigningError {
    /// The key could not be decoded
    #[error(transparent)]
    InvalidKey(#[from] InvalidKey),
}

/// No asynchronous runtime was available to schedule renewals on
#[derive(Debug, Error)]
#[error("token renewal requires a running tokio runtime")]
pub struct NoRuntime {
    #[from]
    source: tokio::runtime::TryCurrentError,
}

/// An error occurring while constructing an authentication provider
#[derive(Debug, Error)]
pub enum ProviderError<E: StdError + 'static> {
    /// The token lifetime configuration is invalid
    #[error(transparent)]
    InvalidTokenLifetime(#[from] InvalidTokenLifetime),

    /// The provider was constructed outside of a tokio runtime
    #[error(transparent)]
    NoRuntime(#[from] NoRuntime),

    /// The initial token could not be signed
    #[error("unable to sign initial token")]
    Signing(#[source] E),
}

impl<E: StdError + 'static> ProviderError<E> {
    /// Whether the error is due to an invalid lifetime configuration
    #[must_use]
    pub fn is_invalid_lifetime(&self) -> bool {
        matches!(self, Self::InvalidTokenLifetime(_))
    }

    /// Whether the error is due to a signing failure
    #[must_use]
    pub fn is_signing(&self) -> bool {
        matches!(self, Self::Signing(_))
    }
}

/// An error occurring while constructing a provider from a connection string
#[derive(Debug, Error)]
pub enum FromConnectionStringError {
    /// The connection string could not be parsed
    #[error(transparent)]
    ConnectionString(#[from] ConnectionStringError),

    /// The provider could not be constructed
    #[error(transparent)]
    Provider(#[from] ProviderError<SigningError>),
}

impl From<InvalidTokenLifetime> for FromConnectionStringError {
    fn from(err: InvalidTokenLifetime) -> Self {
        Self::Provider(err.into())
    }
}

/// A renewal failure observed by subscribers when no caller is waiting on it
pub type RenewalFailure = std::sync::Arc<dyn StdError + Send + Sync + 'static>;
