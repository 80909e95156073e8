//! # Dependency Resolver
//!
//! Drives a plan-creation pass to completion: while the aggregate still has unresolved
//! dependencies, every dependency of the current round is handed to the creator that claims it
//! and the returned responses are merged back.
//!
//! ## Rounds
//!
//! - A round snapshots the pending dependencies in id order and removes them from the aggregate.
//! - Every dependency must be claimed before any creator runs. An unclaimed field fails the whole
//!   pass with the offending node id, field name and YAML `type`.
//! - Creators of one round run concurrently (bounded by `resolver_concurrency`) against the same
//!   context snapshot. Their responses are merged by this task alone, in dependency-id order, so
//!   the outcome does not depend on completion order.
//! - The loop is bounded by `max_resolution_rounds`; a creator that keeps re-emitting
//!   dependencies produces [`PlanCreationError::ResolutionLimitExceeded`] instead of spinning.

use super::context::PlanCreationContext;
use super::creator::PlanCreatorRegistry;
use super::errors::{PlanCreationError, PlanCreationResult};
use super::response::PlanCreationResponse;
use crate::config::PlanCreationConfig;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

pub struct DependencyResolver {
    registry: Arc<PlanCreatorRegistry>,
    config: PlanCreationConfig,
}

impl DependencyResolver {
    pub fn new(registry: Arc<PlanCreatorRegistry>, config: PlanCreationConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<PlanCreatorRegistry> {
        &self.registry
    }

    /// Expand every dependency of `aggregate` until none remain
    #[instrument(skip_all, fields(initial_dependencies = aggregate.dependencies().len()))]
    pub async fn resolve(
        &self,
        mut aggregate: PlanCreationResponse,
    ) -> PlanCreationResult<PlanCreationResponse> {
        let started = Instant::now();
        let concurrency = self.config.resolver_concurrency.max(1);
        let mut rounds = 0;

        while !aggregate.dependencies().is_empty() {
            if rounds >= self.config.max_resolution_rounds {
                let mut unresolved: Vec<String> =
                    aggregate.dependencies().keys().cloned().collect();
                unresolved.sort();
                return Err(PlanCreationError::ResolutionLimitExceeded { rounds, unresolved });
            }
            rounds += 1;

            let mut ids: Vec<String> = aggregate.dependencies().keys().cloned().collect();
            ids.sort();
            debug!(round = rounds, dependencies = ids.len(), "Resolving dependency round");

            let mut work = Vec::with_capacity(ids.len());
            for id in &ids {
                let Some(dependency) = aggregate.remove_dependency(id) else {
                    continue;
                };
                let field = dependency.field();
                let creator = self.registry.find(field).ok_or_else(|| {
                    PlanCreationError::UnclaimedDependency {
                        node_id: id.clone(),
                        field_name: field.name().to_string(),
                        yaml_type: field.node().node_type().unwrap_or_default(),
                    }
                })?;
                let ctx =
                    PlanCreationContext::for_dependency(&dependency, aggregate.context().clone());
                work.push((id.clone(), creator, ctx));
            }

            // `buffered` yields in input order, which is dependency-id order
            let results: Vec<(String, PlanCreationResult<PlanCreationResponse>)> =
                stream::iter(work)
                    .map(|(id, creator, ctx)| async move {
                        debug!(node_id = %id, creator = creator.name(), "Expanding dependency");
                        let result = creator.handle_node(&ctx).await;
                        (id, result)
                    })
                    .buffered(concurrency)
                    .collect()
                    .await;

            for (id, result) in results {
                let response = result.inspect_err(|e| {
                    debug!(node_id = %id, error = %e, "Plan creator failed");
                })?;
                aggregate.merge(response)?;
            }
        }

        info!(
            rounds,
            nodes = aggregate.nodes().len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Dependency resolution complete"
        );
        Ok(aggregate)
    }
}
