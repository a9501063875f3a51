use thiserror::Error;

use crate::NodeId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("no interface bound from node {from} to node {to}")]
    MissingInterface { from: NodeId, to: NodeId },
    #[error("node {0} is not part of the topology")]
    UnknownNode(NodeId),
    #[error("node id {0} exceeds the supported range")]
    NodeIdOutOfRange(NodeId),
}

/// A single CSV row that could not be turned into a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("invalid value {value:?} for field `{field}`")]
    InvalidField { field: &'static str, value: String },
}
