//! Pixelpress - Multi-tier image compression over HTTP
//!
//! This library provides the core functionality for the pixelpress service:
//! uploaded raster images are recompressed at several JPEG quality tiers,
//! each source image's variants are packaged into a zip archive on disk,
//! and per-image success or failure is reported back to the caller.
//!
//! # Architecture
//!
//! - [`raster`] - bilinear resampling of decoded images
//! - [`encode`] - quality tiers and JPEG encoding
//! - [`pipeline`] - per-image compression pipeline (tier fan-out, archive assembly)
//! - [`service`] - per-request orchestration across uploaded files
//! - [`server`] - HTTP surface (upload and download routes)
//! - [`config`] - application configuration
//! - [`app`] - application bootstrap and lifecycle

pub mod app;
pub mod config;
pub mod encode;
pub mod pipeline;
pub mod raster;
pub mod server;
pub mod service;

/// Crate version, exposed for startup banners and logging.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
