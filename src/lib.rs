//! OpenAI-compatible HTTP front end for GUI grounding models.
//!
//! The server either proxies to an OpenAI-compatible inference server,
//! rewriting click coordinates in assistant history into the model's box
//! tokens, or runs a vision-language model in-process. Both modes also serve a
//! flat `/grounding/generate` endpoint that returns parsed screen coordinates.

pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod messages;
pub mod parsers;
pub mod routers;
pub mod server;

pub use error::{GroundingError, GroundingResult};
pub use server::{build_app, build_backend, AppState};
