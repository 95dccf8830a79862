//! # mongo-fluent
//!
//! A fluent MongoDB query builder.
//!
//! Chained calls accumulate per-statement options; a terminal call compiles
//! them into a bulk write or an aggregation pipeline and hands it to an
//! executor.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mongo_fluent::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let executor = MongoExecutor::connect(MongoExecutorConfig::default()).await?;
//!     let connection = Connection::new(executor, QueryConfig::new("app"))?;
//!
//!     let mut users = connection.collection("users");
//!     users
//!         .where_(doc! { "name": "Ann" })
//!         .limit(1)
//!         .update(doc! { "age": ["$inc", 1] })
//!         .await?;
//!
//!     let page = users.sort(doc! { "age": -1 }).page(2).await?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use fluent_query::*;

/// The driver-backed executor.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use fluent_mongodb::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use fluent_query::prelude::*;

    #[cfg(feature = "mongodb")]
    pub use fluent_mongodb::prelude::*;
}
