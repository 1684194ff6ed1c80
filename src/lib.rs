//! Time-indexed samples and the query-time views built from them.
//!
//! Raw samples are assembled into timestamp-ordered [`results::Results`],
//! optionally converted to per-second gauges with [`query::Rate`], and
//! described for query execution by a [`query::ResultDescriptor`]. The
//! [`api`] module exposes insert and range select over HTTP against any
//! [`storage::SampleRepository`].

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod query;
pub mod results;
pub mod storage;
pub mod time;

pub use config::ServerConfig;
pub use error::{Result, SeriesError};
pub use models::{MetricType, Resource, Sample, SampleDto, ValueType};
pub use results::{Element, Results, Row};
pub use time::{Duration, TimeUnit, Timestamp};
