use serde::{Deserialize, Serialize};

/// Parameters of `POST /grounding/generate`.
///
/// Both fields are optional at the wire level so that a missing value can be
/// reported through the error envelope instead of a bare extractor rejection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GroundingRequest {
    pub prompt: Option<String>,
    /// Base64 image, with or without a `data:<mime>;base64,` prefix
    pub image: Option<String>,
}

impl GroundingRequest {
    /// Fill fields missing here from `fallback`.
    pub fn or(self, fallback: GroundingRequest) -> Self {
        Self {
            prompt: self.prompt.or(fallback.prompt),
            image: self.image.or(fallback.image),
        }
    }
}

/// An on-screen point, serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct Coordinate {
    pub x: u32,
    pub y: u32,
}

impl Coordinate {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl From<(u32, u32)> for Coordinate {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

impl From<Coordinate> for (u32, u32) {
    fn from(point: Coordinate) -> Self {
        (point.x, point.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GroundingResponse {
    pub response: String,
    /// Always present on the wire, `null` when no point could be parsed
    pub coordinates: Option<Coordinate>,
}
