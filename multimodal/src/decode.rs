use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::RgbImage;
use tracing::debug;

use crate::error::{DecodeError, DecodeResult};

/// Prefix shared by every data URL.
pub const DATA_URL_PREFIX: &str = "data:";

/// Header used when a bare base64 payload has to be turned into a data URL.
pub const DEFAULT_DATA_URL_HEADER: &str = "data:image/png;base64,";

pub fn is_data_url(url: &str) -> bool {
    url.starts_with(DATA_URL_PREFIX)
}

/// Wrap a bare base64 payload as a PNG data URL; data URLs pass through.
pub fn ensure_data_url(image: &str) -> String {
    if is_data_url(image) {
        image.to_string()
    } else {
        format!("{DEFAULT_DATA_URL_HEADER}{image}")
    }
}

/// Decode a base64 image, optionally prefixed by `data:<mime>;base64,`.
///
/// Everything up to and including the first comma is discarded, so a comma
/// inside an unusual prefix is taken as the header boundary. ASCII whitespace
/// in the payload (line-wrapped base64) is ignored. The result is always
/// 3-channel RGB: alpha and palettes are flattened away.
pub fn decode_image(data: &str) -> DecodeResult<RgbImage> {
    let payload = match data.split_once(',') {
        Some((_, rest)) => rest,
        None => data,
    };

    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return Err(DecodeError::Empty);
    }

    let bytes = STANDARD.decode(compact.as_bytes())?;
    let decoded = image::load_from_memory(&bytes)?;
    debug!(
        width = decoded.width(),
        height = decoded.height(),
        color = ?decoded.color(),
        "Decoded inline image"
    );

    Ok(decoded.to_rgb8())
}
