//! # Execution Graph Visualization
//!
//! Read-only view of a running plan execution for clients:
//!
//! - [`generator`] builds an [`EphemeralOrchestrationGraph`] adjacency list from node executions
//! - [`converter`] projects it, without dropping fields, onto the [`dto`] types

pub mod converter;
pub mod dto;
pub mod generator;
pub mod model;

pub use converter::failure_info_dto;
pub use dto::{
    AmbianceDto, EdgeListDto, FailureDataDto, FailureInfoDto, GraphVertexDto, LevelDto,
    OrchestrationAdjacencyListDto, OrchestrationGraphDto, StrategyMetadataDto,
};
pub use generator::GraphGenerator;
pub use model::{EdgeList, EphemeralOrchestrationGraph, GraphVertex, OrchestrationAdjacencyList};
