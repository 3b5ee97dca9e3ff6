pub mod client;

pub use client::{DetectionClient, DetectionError, DetectorConfig};
