//! Quyca
//!
//! A bibliometrics reporting service over a KAHI MongoDB database. Computes
//! research product listings, headline indicators and dashboard plots for
//! institutions, faculties, departments, research groups, researchers and
//! journals.
//!
//! # Features
//!
//! - **21 plots**: yearly series, distributions, per sub-unit bars, collaboration maps and networks
//! - **Aggregation pipelines**: every statistic is pushed down to MongoDB
//! - **Normalized APC costs**: converted to USD and adjusted to a reference year
//! - **Cached**: plot and indicator results kept in an in-memory TTL cache
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use quyca::{Config, CurrencyConverter, MongoStore, Services};
//! use quyca::models::{Resource, WorkFilters};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = MongoStore::connect(&config).await?;
//!     let currency = CurrencyConverter::new(config.apc_target_year);
//!     let services = Services::new(Arc::new(store), config, currency);
//!
//!     let target = services.target(Resource::Affiliation, "65a1b2c3d4e5f60718293a4b").await?;
//!     let plot = services.plots.plot(&target, "year_type", &WorkFilters::default()).await?;
//!     println!("{plot}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod formatters;
pub mod models;
pub mod pipeline;
pub mod plots;
pub mod server;
pub mod services;
pub mod stats;
pub mod store;

pub use config::Config;
pub use error::{ServiceError, StoreError};
pub use services::Services;
pub use stats::CurrencyConverter;
pub use store::{MongoStore, Store};
