//! Parsing of device connection strings
//!
//! A connection string is a list of `Key=Value` pairs separated by `;`, such as
//! `HostName=hub.example.net;DeviceId=sensor-7;SharedAccessKey=a2V5`.

use std::str::FromStr;

use crate::{
    error::{self, ConnectionStringError},
    DeviceId, DeviceIdentity, HostName, SharedAccessKey, SharedAccessKeyName,
};

const HOST_NAME: &str = "HostName";
const DEVICE_ID: &str = "DeviceId";
const SHARED_ACCESS_KEY_NAME: &str = "SharedAccessKeyName";
const SHARED_ACCESS_KEY: &str = "SharedAccessKey";

/// A parsed connection string
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionString {
    pairs: Vec<(String, String)>,
}

impl ConnectionString {
    /// Parses a connection string into its key/value pairs
    ///
    /// Only the structure is checked here; see [`ConnectionString::device_identity`]
    /// for extracting the parameters required for shared access key authentication.
    pub fn parse(s: &str) -> Result<Self, ConnectionStringError> {
        if s.is_empty() {
            return Err(error::empty_connection_string().into());
        }

        let pairs = s
            .split(';')
            .enumerate()
            .filter(|(_, segment)| !segment.is_empty())
            .map(|(idx, segment)| {
                segment
                    .split_once('=')
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .ok_or_else(|| error::malformed_connection_string(idx))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { pairs })
    }

    /// Gets the value associated with `key`
    ///
    /// If a key appears more than once, the last value wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, key: &'static str) -> Result<&str, ConnectionStringError> {
        self.get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| error::missing_connection_parameter(key).into())
    }

    /// Extracts the identity of the device
    ///
    /// `HostName`, `DeviceId`, and `SharedAccessKey` are required.
    /// `SharedAccessKeyName` is optional.
    pub fn device_identity(&self) -> Result<DeviceIdentity, ConnectionStringError> {
        let device_id = DeviceId::new(self.require(DEVICE_ID)?.to_owned());
        let host = HostName::new(self.require(HOST_NAME)?.to_owned());
        let key = SharedAccessKey::new(self.require(SHARED_ACCESS_KEY)?.to_owned());
        let key_name = self
            .get(SHARED_ACCESS_KEY_NAME)
            .filter(|v| !v.is_empty())
            .map(|v| SharedAccessKeyName::new(v.to_owned()));

        Ok(DeviceIdentity::new(host, device_id, key_name, key))
    }
}

impl FromStr for ConnectionString {
    type Err = ConnectionStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromStr for DeviceIdentity {
    type Err = ConnectionStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConnectionString::parse(s)?.device_identity()
    }
}
