#![forbid(unsafe_code)]
//! ordo-core library.
//!
//! Dependency-ordered execution for test units: build "depends on" graphs from
//! declared names, report cycles with their path, order units and groups,
//! compute the necessary set of a partial request, and decide at run time
//! whether a unit must be skipped because a dependency did not pass.
//!
//! # Conventions
//!
//! - **Errors**: fatal problems are [`OrderError`]; advisory ones are
//!   [`Issue`] values returned next to a successful result. Config loading
//!   uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod builder;
pub mod config;
pub mod error;
pub mod graph;
pub mod identity;
pub mod issue;
pub mod ledger;
pub mod model;
pub mod necessary;
pub mod orderer;
pub mod plan;
pub mod run;
pub mod skip;

pub use builder::{BuiltGraph, Dependent, build_group_graph, build_unit_graph};
pub use config::{OrdoConfig, load_project_config};
pub use error::{ErrorCode, OrderError};
pub use graph::DirectedGraph;
pub use identity::{ByValue, CaseInsensitive, GroupIdentity, IdentityPolicy, UnitIdentity};
pub use issue::{Issue, IssueKind};
pub use ledger::{Ledger, ResultLedger};
pub use model::{Group, Outcome, Scope, Unit, UnitId, UnitState};
pub use necessary::{NecessarySet, resolve, resolve_with_groups};
pub use orderer::{Ordering, order_groups, order_units};
pub use plan::{PlannedGroup, RunPlan, plan_run};
pub use run::RunTracker;
pub use skip::{SkipEvaluator, SkipReason, SkipVerdict, evaluate, should_skip};
