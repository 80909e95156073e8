use super::errors::{AdviseError, AdviseResult};
use super::types::{AdviserResponse, AdvisingEvent};
use crate::plan::obtainment::{decode_parameters, AdviserType};
use serde::de::DeserializeOwned;

/// Decides what happens after a node execution reaches a status.
///
/// Advisers attached to a node are consulted in order; the first one whose
/// [`can_advise`](Adviser::can_advise) returns `true` makes the decision.
pub trait Adviser: Send + Sync {
    fn adviser_type(&self) -> AdviserType;

    fn can_advise(&self, event: &AdvisingEvent) -> AdviseResult<bool>;

    fn on_advise(&self, event: &AdvisingEvent) -> AdviseResult<AdviserResponse>;
}

/// Decode the event's parameter blob for `adviser_type`
pub(crate) fn parameters_of<T: DeserializeOwned + Default>(
    adviser_type: &AdviserType,
    event: &AdvisingEvent,
) -> AdviseResult<T> {
    decode_parameters(&event.adviser_parameters).map_err(|e| AdviseError::InvalidParameters {
        adviser_type: adviser_type.to_string(),
        node_id: event.plan_node_id.clone(),
        reason: e.to_string(),
    })
}
