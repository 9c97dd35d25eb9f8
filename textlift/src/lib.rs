pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod ocr;
pub mod ratelimit;
