#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/xiaoyuan/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! XiaoYuan A-share fundamentals provider.
//!
//! This crate ties the endpoints of `xiaoyuan-models` to an injected
//! [`FactorReader`]:
//!
//! - [`XiaoYuanProvider`] - Model name to fetcher registry
//! - [`ROUTES`] - Command paths such as `equity.fundamental.income`
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use serde_json::json;
//! use xiaoyuan::{InMemoryReader, XiaoYuanProvider};
//!
//! let provider = XiaoYuanProvider::new(Arc::new(InMemoryReader::new()));
//! let envelope = provider
//!     .call("equity.fundamental.ratios", &json!({"symbol": "SH600519"}))
//!     .await?;
//! ```

// Re-export core and endpoint types
pub use xiaoyuan_core::*;
pub use xiaoyuan_models as models;
pub use xiaoyuan_reader::{InMemoryReader, NoopReader};

mod provider;
pub use provider::{Command, Envelope, XiaoYuanProvider};

mod router;
pub use router::{ROUTES, Route, find_route};
