//! Synthetic telecom usage and churn dataset generator.
//!
//! `generator::generate(&config, seed)` is the pure entry point and returns
//! the three tables in memory. `export` and `store` layer CSV and SQLite
//! output on top; `analytics` reads a finished dataset.

pub mod analytics;
pub mod churn;
pub mod company_names;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod metrics;
pub mod population;
pub mod rng;
pub mod store;
pub mod synth;
pub mod temporal;
pub mod types;
pub mod window;

pub use config::GeneratorConfig;
pub use error::{GenError, GenResult};
pub use generator::{generate, Dataset, Generator};
