//! Shared access signature construction

use std::error;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hubauth_clock::UnixTime;

use crate::{
    error::{self as errors, SigningError},
    DeviceIdRef, HostNameRef, SharedAccessKeyNameRef, SharedAccessKeyRef, SharedAccessSignature,
    SharedAccessSignatureRef,
};

const SCHEME: &str = "SharedAccessSignature";

/// Builds the resource identifier a device token is scoped to
///
/// The identifier is `<host>/devices/<device id>`, with every character other
/// than `A`–`Z`, `a`–`z`, `0`–`9`, `-`, `_`, `.`, and `~` percent-encoded.
pub fn resource_uri(host: &HostNameRef, device_id: &DeviceIdRef) -> String {
    let raw = format!("{}/devices/{}", host.as_str(), device_id.as_str());
    urlencoding::encode(&raw).into_owned()
}

/// A type that can sign tokens for a resource
pub trait TokenSigner {
    /// The error type returned in the event that signing fails
    type Error: error::Error + Send + Sync + 'static;

    /// Signs a token for `resource_uri` that expires at `expiry`
    fn sign(
        &self,
        resource_uri: &str,
        key_name: Option<&SharedAccessKeyNameRef>,
        key: &SharedAccessKeyRef,
        expiry: UnixTime,
    ) -> Result<SharedAccessSignature, Self::Error>;
}

/// Signs tokens using HMAC-SHA256 over the resource and expiry
#[derive(Clone, Copy, Debug, Default)]
pub struct SharedAccessKeySigner;

impl SharedAccessKeySigner {
    /// Computes the URI-encoded signature over `resource_uri` and `expiry`
    pub fn signature(
        &self,
        resource_uri: &str,
        key: &SharedAccessKeyRef,
        expiry: UnixTime,
    ) -> Result<String, SigningError> {
        let secret = STANDARD
            .decode(key.as_str())
            .map_err(errors::invalid_key)?;
        let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, &secret);
        let string_to_sign = format!("{}\n{}", resource_uri, expiry.0);
        let tag = ring::hmac::sign(&key, string_to_sign.as_bytes());
        let encoded = STANDARD.encode(tag.as_ref());
        Ok(urlencoding::encode(&encoded).into_owned())
    }
}

impl TokenSigner for SharedAccessKeySigner {
    type Error = SigningError;

    fn sign(
        &self,
        resource_uri: &str,
        key_name: Option<&SharedAccessKeyNameRef>,
        key: &SharedAccessKeyRef,
        expiry: UnixTime,
    ) -> Result<SharedAccessSignature, Self::Error> {
        let sig = self.signature(resource_uri, key, expiry)?;
        let mut token = format!("{} sr={}&sig={}&se={}", SCHEME, resource_uri, sig, expiry.0);
        if let Some(name) = key_name {
            token.push_str("&skn=");
            token.push_str(&urlencoding::encode(name.as_str()));
        }
        Ok(SharedAccessSignature::new(token))
    }
}

impl SharedAccessSignatureRef {
    fn field(&self, name: &str) -> Option<&str> {
        self.as_str()
            .strip_prefix(SCHEME)?
            .trim_start()
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    /// The expiry encoded in the `se` field of the token
    pub fn expiry(&self) -> Option<UnixTime> {
        self.field("se")?.parse().ok().map(UnixTime)
    }

    /// The resource the token is scoped to, as encoded in the `sr` field
    pub fn resource_uri(&self) -> Option<&str> {
        self.field("sr")
    }
}
