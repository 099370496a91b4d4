//! REST client for the PixCI conversion service.
//!
//! Wraps the image -> markup encoder, the markup -> PNG decoder and the
//! health probe, and exposes them to the editor through the
//! [`ArtifactCodec`](service::ArtifactCodec) trait.

pub mod api;
pub mod messages;
pub mod service;
