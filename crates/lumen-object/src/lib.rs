#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants
pub const TRACING_TARGET_CLIENT: &str = "lumen_object::client";

pub mod client;
/// Client trait and the S3 provider.
pub mod providers;
/// Error and header types.
pub mod types;
