#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Pipeline Core
//!
//! Plan-graph construction, node advising and orchestration event publishing for a
//! pipeline execution engine.
//!
//! ## Overview
//!
//! A pipeline YAML document is compiled into a graph of [`plan::PlanNode`]s. Composite
//! constructs (execution, parallel blocks, step groups) enumerate their children as
//! unresolved dependencies, and the [`plan::DependencyResolver`] keeps handing those to
//! pluggable plan creators until nothing is left to expand.
//!
//! While the plan runs (the execution engine itself lives elsewhere), this crate:
//!
//! - decides what happens after every node finishes ([`advise`]), including routing failures
//!   into rollback sections
//! - records every transition in an append-only event log and batches change signals for
//!   visualization consumers ([`events`])
//! - projects the live execution state into a client-facing adjacency-list graph ([`graph`])
//!
//! ## Module Organization
//!
//! - [`yaml`] - YAML document model with stable node ids
//! - [`models`] - ambiance, node executions, failure info, step parameters
//! - [`plan`] - plan nodes, creation responses, creators and the dependency resolver
//! - [`advise`] - advisers, the advise queue and rollback propagation
//! - [`events`] - orchestration event log, batching publisher and observers
//! - [`graph`] - visualization graph and DTO mapping
//! - [`config`] - layered configuration
//! - [`logging`] - structured logging
//! - [`error`] - error taxonomy
//! - [`bootstrap`] - wiring of all of the above
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pipeline_core::config::PlanCreationConfig;
//! use pipeline_core::plan::PlanCreatorService;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = PlanCreatorService::with_defaults(PlanCreationConfig::default());
//! let plan = service
//!     .create_plan(
//!         r#"
//! execution:
//!   steps:
//!     - step:
//!         identifier: build
//!         type: ShellScript
//! "#,
//!     )
//!     .await?;
//! println!("plan {} has {} nodes", plan.plan_id, plan.nodes.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit and integration tests
//! ```

pub mod advise;
pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod graph;
pub mod logging;
pub mod models;
pub mod plan;
pub mod yaml;

pub use bootstrap::{CoreStatus, OrchestrationCore};
pub use config::{ConfigManager, PipelineCoreConfig};
pub use constants::{status_groups, Status};
pub use error::{OrchestrationError, Result};
pub use plan::{Plan, PlanCreatorService};
