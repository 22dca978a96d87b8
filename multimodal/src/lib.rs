//! Image decoding for grounding requests.
//!
//! Turns inline base64 payloads (optionally wrapped in a data URL) into
//! three-channel RGB images ready for a vision-language model.

pub mod decode;
pub mod error;

pub use decode::{decode_image, ensure_data_url, is_data_url, DATA_URL_PREFIX, DEFAULT_DATA_URL_HEADER};
pub use error::{DecodeError, DecodeResult};
