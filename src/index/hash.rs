use serde_json::Value;
use sha2::{Digest, Sha256};

/// Content hash addressing ordinary index entries.
///
/// SHA-256 over the value's JSON encoding, rendered as lower-case hex, so
/// the string `"ff8"` and a document field holding `"ff8"` always land on
/// the same entry name regardless of which writer produced them.
pub fn hash_value(value: &Value) -> String {
    let digest = Sha256::digest(value.to_string().as_bytes());

    let mut hex = String::with_capacity(64);
    for byte in digest {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}
