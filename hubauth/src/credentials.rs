//! Device identity and the credential snapshots handed to transports

use serde::{Deserialize, Serialize};

use crate::{
    DeviceId, DeviceIdRef, HostName, HostNameRef, SharedAccessKey, SharedAccessKeyName,
    SharedAccessKeyNameRef, SharedAccessKeyRef, SharedAccessSignature, SharedAccessSignatureRef,
};

/// The long-lived identity of a device
///
/// This does not change for the lifetime of an authentication provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    host: HostName,
    device_id: DeviceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shared_access_key_name: Option<SharedAccessKeyName>,
    shared_access_key: SharedAccessKey,
}

impl DeviceIdentity {
    /// Constructs a new device identity
    pub fn new(
        host: HostName,
        device_id: DeviceId,
        shared_access_key_name: Option<SharedAccessKeyName>,
        shared_access_key: SharedAccessKey,
    ) -> Self {
        Self {
            host,
            device_id,
            shared_access_key_name,
            shared_access_key,
        }
    }

    /// The host name of the hub
    #[inline]
    pub fn host(&self) -> &HostNameRef {
        &self.host
    }

    /// The device identifier
    #[inline]
    pub fn device_id(&self) -> &DeviceIdRef {
        &self.device_id
    }

    /// The shared access policy name, if the key belongs to a policy rather than the device
    #[inline]
    pub fn shared_access_key_name(&self) -> Option<&SharedAccessKeyNameRef> {
        self.shared_access_key_name.as_deref()
    }

    /// The shared access key
    #[inline]
    pub fn shared_access_key(&self) -> &SharedAccessKeyRef {
        &self.shared_access_key
    }
}

/// A snapshot of the credentials a transport needs to authenticate
///
/// Snapshots are values: a later renewal never changes a snapshot that has
/// already been handed out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCredentials {
    host: HostName,
    device_id: DeviceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shared_access_key_name: Option<SharedAccessKeyName>,
    shared_access_signature: SharedAccessSignature,
}

impl DeviceCredentials {
    pub(crate) fn new(identity: &DeviceIdentity, token: &SharedAccessSignatureRef) -> Self {
        Self {
            host: identity.host.clone(),
            device_id: identity.device_id.clone(),
            shared_access_key_name: identity.shared_access_key_name.clone(),
            shared_access_signature: token.to_owned(),
        }
    }

    /// The host name of the hub
    #[inline]
    pub fn host(&self) -> &HostNameRef {
        &self.host
    }

    /// The device identifier
    #[inline]
    pub fn device_id(&self) -> &DeviceIdRef {
        &self.device_id
    }

    /// The shared access policy name, if any
    #[inline]
    pub fn shared_access_key_name(&self) -> Option<&SharedAccessKeyNameRef> {
        self.shared_access_key_name.as_deref()
    }

    /// The signed token
    #[inline]
    pub fn shared_access_signature(&self) -> &SharedAccessSignatureRef {
        &self.shared_access_signature
    }
}
