//! # fluent-mongodb
//!
//! MongoDB executor for `fluent-query`, built on the official driver.
//!
//! This crate provides:
//! - [`MongoExecutor`], running compiled bulk writes and aggregate commands
//! - Client configuration with built-in connection pooling
//! - Server version detection through `buildInfo`
//!
//! ## Example
//!
//! ```rust,ignore
//! use fluent_mongodb::{MongoExecutor, MongoExecutorConfig};
//! use fluent_query::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let executor = MongoExecutor::connect(
//!         MongoExecutorConfig::builder()
//!             .uri("mongodb://localhost:27017")
//!             .build()?,
//!     )
//!     .await?;
//!
//!     let connection = Connection::new(executor, QueryConfig::new("app"))?;
//!     let mut users = connection.collection("users");
//!     users.insert(doc! { "name": "Ann" }).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod executor;

pub use config::{MongoExecutorConfig, MongoExecutorConfigBuilder, ReadPreference};
pub use error::{MongoError, MongoResult};
pub use executor::MongoExecutor;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{MongoExecutorConfig, MongoExecutorConfigBuilder, ReadPreference};
    pub use crate::error::{MongoError, MongoResult};
    pub use crate::executor::MongoExecutor;
}
