//! Core types shared by the oEmbed client and its front ends.
//!
//! This crate provides:
//! - Unified error types
//! - The decoded oEmbed document
//! - Configuration structures

pub mod config;
pub mod error;
pub mod oembed;

pub use config::{AppConfig, ConfigError, EndpointConfig, GatewayOptions, Params, RegistryConfig};
pub use error::Error;
pub use oembed::{OEmbed, OEmbedType};
