//! Logging facade for the New Relic Lambda CLI.
//!
//! # Setup
//!
//! To enable logging, invoke the [`init`] function with a [`LogConfig`]. This is only available
//! with the `init` feature, which the CLI binary enables. Library crates depend on this crate
//! without features and only use the logging macros.
//!
//! ```
//! # #[cfg(feature = "init")] {
//! use nr_lambda_log::LogConfig;
//!
//! let config = LogConfig {
//!     verbose: true,
//!     ..LogConfig::default()
//! };
//!
//! nr_lambda_log::init(&config);
//! # }
//! ```
//!
//! # Logging
//!
//! The basic use of this crate is through the five logging macros: [`error!`], [`warn!`],
//! [`info!`], [`debug!`] and [`trace!`], where `error!` represents the highest-priority log
//! messages and `trace!` the lowest. Messages are filtered by the configured level, which can be
//! overridden through the `RUST_LOG` environment variable.
//!
//! ## Conventions
//!
//! Log messages should start lowercase and end without punctuation. Prefer short and precise log
//! messages over verbose text. Choose the log level according to these rules:
//!
//! - [`error!`] for bugs and invalid behavior.
//! - [`warn!`] for undesirable behavior.
//! - [`info!`] for messages relevant to the average user.
//! - [`debug!`] for messages usually relevant to debugging.
//! - [`trace!`] for full auxiliary information.

#![warn(missing_docs)]

#[cfg(feature = "init")]
mod setup;
#[cfg(feature = "init")]
pub use setup::*;

// Expose the minimal tracing facade.
#[doc(inline)]
pub use tracing::{debug, error, info, trace, warn};
