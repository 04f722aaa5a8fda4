//! # rpm-config
//!
//! TOML-driven configuration for the vitals pipeline.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use rpm_config::PipelineConfig;
//!
//! let config = PipelineConfig::from_file(Path::new("demo/config/pipeline.toml"))?;
//! let producer_settings = config.producer.to_settings();
//! ```
//!
//! The patient roster is configuration: the producer emits for exactly the
//! patients listed here, in order.

pub mod loader;
pub mod settings;

pub use settings::{
    default_roster, ConsumerSection, NotificationSection, PipelineConfig, ProducerSection,
    TransportSection,
};

// ── Tests ─────────────────────────────────────────────────────────────────────
