//! Instrumentation reconciliation engine for the New Relic Lambda CLI.
//!
//! This crate computes the exact configuration change that instruments or de-instruments a Lambda
//! function: the rewritten entry point, the merged environment variables, and the updated layer
//! list. The hard requirements are that reconciliation is *idempotent* (installing twice is a
//! detectable no-op), *runtime polymorphic* (each language family wraps the handler differently,
//! or not at all), and *invertible* (uninstall restores exactly the pre-install handler,
//! variables and layers, leaving everything user-owned untouched).
//!
//! # Structure
//!
//! - [`RuntimeFamily`]: classifies runtime identifiers into language families and knows each
//!   family's wrapper handlers.
//! - [`layer_selection`]: picks the instrumentation layer ARN for a runtime and architecture from
//!   the published candidates, prompting interactively only when the choice is ambiguous.
//! - [`reconcile_install`] / [`reconcile_uninstall`]: the pure reconcilers. They take a
//!   configuration snapshot and the caller's intent and return a complete replacement
//!   configuration, or a signal that nothing should change.
//! - [`install`] / [`uninstall`]: thin orchestrators that read the current configuration, invoke
//!   the reconcilers and push the result through the control-plane traits of `nr-lambda-aws`.
//!
//! The engine holds no state between invocations. Every reconciliation is a pure function of one
//! function's configuration snapshot and the requested options; the orchestrator applies the
//! result in a single write.

#![warn(missing_docs)]

mod error;
mod install;
mod policy;
mod runtime;
mod select;
mod uninstall;
pub mod vars;

pub use error::*;
pub use install::*;
pub use policy::*;
pub use runtime::*;
pub use select::*;
pub use uninstall::*;
