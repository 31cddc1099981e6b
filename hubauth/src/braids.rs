use aliri_braid::braid;
use std::fmt;

/// Hides a secret behind a placeholder unless formatted with `{:#}`/`{:#?}`
///
/// The alternate debug form shows at most `$prefix` characters (or the format
/// width, if given). The alternate display form shows the whole secret.
macro_rules! redacted {
    ($ty:ty: $label:literal, $prefix:literal) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                if !f.alternate() {
                    return f.write_str(concat!("<redacted ", $label, ">"));
                }
                f.write_str("\"")?;
                reveal_prefix(&self.0, f, $prefix)?;
                f.write_str("\"")
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                if f.alternate() {
                    f.write_str(&self.0)
                } else {
                    f.write_str(concat!("<redacted ", $label, ">"))
                }
            }
        }
    };
}

fn reveal_prefix(secret: &str, f: &mut fmt::Formatter, default_chars: usize) -> fmt::Result {
    let max_chars = f.width().unwrap_or(default_chars);
    if secret.chars().count() <= max_chars {
        return f.write_str(secret);
    }

    // one character of the budget goes to the ellipsis
    let keep = max_chars.saturating_sub(1);
    let end = secret
        .char_indices()
        .nth(keep)
        .map_or(secret.len(), |(idx, _)| idx);
    f.write_str(&secret[..end])?;
    f.write_str("…")
}

/// The host name of the hub a device connects to
#[braid(serde)]
pub struct HostName;

/// A device identifier, unique within a hub
#[braid(serde)]
pub struct DeviceId;

/// The name of a shared access policy
#[braid(serde)]
pub struct SharedAccessKeyName;

/// A base64-encoded shared access key
#[braid(serde, debug = "owned", display = "owned")]
pub struct SharedAccessKey;

redacted!(SharedAccessKeyRef: "shared access key", 5);

/// A serialized shared access signature token
#[braid(serde, debug = "owned", display = "owned")]
pub struct SharedAccessSignature;

redacted!(SharedAccessSignatureRef: "shared access signature", 30);
