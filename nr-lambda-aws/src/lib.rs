//! AWS control-plane clients for the New Relic Lambda CLI.
//!
//! The reconciliation engine in `nr-lambda-layers` never talks to AWS directly. It depends on the
//! narrow async traits defined in this crate ([`FunctionApi`], [`RoleApi`], [`LicenseKeyApi`] and
//! [`LayerIndex`]), which cover exactly the control-plane calls the engine needs:
//!
//! - fetch and update a function's configuration, and tag it
//! - attach and detach the IAM policy granting access to the license-key secret
//! - resolve the license-key secret stack's outputs
//! - list the published instrumentation layers for a region
//!
//! [`AwsControlPlane`] implements the first three on top of the AWS SDK, and
//! [`HostedLayerIndex`] implements the last one against New Relic's hosted layer index. Tests in
//! the engine substitute in-memory fakes for all four.

#![warn(missing_docs)]

mod api;
mod index;
mod sdk;
mod types;

pub use api::*;
pub use index::*;
pub use sdk::*;
pub use types::*;
