//! Text rewriting and parsing around the grounding model.

pub mod box_tokens;
pub mod coordinates;
pub mod response_text;

pub use box_tokens::{add_box_tokens, BoxTokens};
pub use coordinates::parse_coordinates;
pub use response_text::extract_response_text;
