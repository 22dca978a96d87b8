//! HTTP handlers. Each one is a thin adapter over [`crate::backend::GroundingBackend`].

pub mod chat;
pub mod error;
pub mod grounding;
pub mod health;
