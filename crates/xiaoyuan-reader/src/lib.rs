#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/xiaoyuan/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Reader implementations for the XiaoYuan provider.
//!
//! This crate provides implementations of the [`FactorReader`] trait from `xiaoyuan-core`:
//!
//! - [`InMemoryReader`] - Scripted reader for testing and development
//! - [`NoopReader`] - Reader that never returns data

/// In-memory reader implementation.
pub mod memory;
/// No-op reader implementation.
pub mod noop;

// Re-export the trait for convenience
pub use xiaoyuan_core::FactorReader;

// Re-export implementations
pub use memory::InMemoryReader;
pub use noop::NoopReader;
