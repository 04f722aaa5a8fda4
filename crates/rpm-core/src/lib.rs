//! # rpm-core
//!
//! The vitals ingestion pipeline for remote patient monitoring.
//!
//! This crate provides:
//! - The collaborator traits (`traits`) the pipeline depends on
//! - `classify`, the threshold-based risk classifier
//! - `StreamStatusGate`, the producer's fail-closed ON/OFF gate
//! - `VitalsProducer`, which emits synthetic readings onto the stream
//! - `VitalsConsumer`, which classifies, stores, summarizes, and alerts
//! - `AlertPublisher`, the best-effort notification side channel
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rpm_core::{VitalsConsumer, AlertPublisher};
//!
//! let consumer = VitalsConsumer::new(vitals, summaries, alerts, AlertPublisher::disabled());
//! let report = consumer.process_batch(&records);
//! ```

pub mod consumer;
pub mod gate;
pub mod generator;
pub mod producer;
pub mod publisher;
pub mod risk;
pub mod traits;

pub use consumer::{BatchReport, ConsumerSettings, RecordOutcome, VitalsConsumer};
pub use gate::StreamStatusGate;
pub use producer::{CycleReport, ProducerSettings, VitalsProducer};
pub use publisher::{AlertPublisher, Delivery};
pub use risk::classify;

// ── Tests ─────────────────────────────────────────────────────────────────────
