//! # Plan Creation
//!
//! Turns a pipeline YAML document into an executable plan graph.
//!
//! A pass starts from a single dependency (the `execution` field). The
//! [`DependencyResolver`] repeatedly hands pending dependencies to the
//! [`PartialPlanCreator`] registered for their field; each creator returns a
//! [`PlanCreationResponse`] with finished [`PlanNode`]s and possibly deeper dependencies.
//! Responses are merged until nothing is left to expand.
//!
//! ## Components
//!
//! - [`response`] - the mergeable accumulator and its invariants
//! - [`layout`] - visualization topology built alongside the plan
//! - [`creator`] - creator trait and registry
//! - [`creators`] - built-in execution / step / parallel / step-group creators
//! - [`resolver`] - the resolution loop
//! - [`service`] - YAML in, [`Plan`] out

pub mod context;
pub mod creator;
pub mod creators;
pub mod errors;
pub mod layout;
pub mod node;
pub mod obtainment;
pub mod resolver;
pub mod response;
pub mod service;

pub use context::PlanCreationContext;
pub use creator::{PartialPlanCreator, PlanCreatorRegistry};
pub use errors::{PlanCreationError, PlanCreationResult};
pub use layout::{EdgeLayoutList, GraphLayoutNode, GraphLayoutResponse};
pub use node::{PlanNode, PlanNodeBuilder};
pub use obtainment::{AdviserObtainment, AdviserType, FacilitatorObtainment, FacilitatorType};
pub use resolver::DependencyResolver;
pub use response::{Dependency, PlanCreationResponse};
pub use service::{Plan, PlanCreatorService};
