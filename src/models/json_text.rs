//! Encode/decode boundary for JSON stored in TEXT columns.
//!
//! Rows keep structured fields (custom fields, localized titles, content
//! blocks, tags) as JSON text. Query modules call `encode` before every write
//! and `decode` on every read so the rest of the crate only sees typed values.

use serde::Serialize;
use serde::de::DeserializeOwned;

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(text)
}
