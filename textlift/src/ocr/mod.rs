//! OCR collaborator module.
//!
//! Text extraction itself is an external black box: the Google Cloud Vision
//! REST API. This module owns the client plumbing only:
//! - `GoogleVisionClient` speaks the `images:annotate` wire format
//! - `OcrProvider` wraps it with availability tracking and a bounded timeout
//!
//! A provider built without an API key degrades to `Unavailable` instead of
//! failing startup; requests then get an upstream error while the rest of
//! the service (health, cache endpoints) keeps working.

mod api;
mod provider;

pub use api::{GoogleVisionClient, OcrOutcome};
pub use provider::OcrProvider;

/// Engine identifier reported in responses and error bodies.
pub const OCR_ENGINE: &str = "google";
