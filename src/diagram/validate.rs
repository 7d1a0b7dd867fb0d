use crate::{
    bpmn::NodeType,
    diagram::{DiagramModel, FlowEdge},
};
use log::warn;
use std::{collections::HashSet, fmt::Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEnd {
    Source,
    Target,
}

impl Display for EdgeEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeEnd::Source => f.write_str("source"),
            EdgeEnd::Target => f.write_str("target"),
        }
    }
}

/// Problem found in a malformed diagram. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    MissingNodeId {
        name: String,
        node_type: NodeType,
    },
    EmptyReference {
        end: EdgeEnd,
        edge: String,
    },
    UnknownReference {
        end: EdgeEnd,
        id: String,
        name: String,
        edge: String,
    },
}

impl Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::MissingNodeId { name, node_type } => {
                write!(f, r#"{node_type} "{name}" has no id"#)
            }
            Warning::EmptyReference { end, edge } => {
                write!(f, "Sequence flow {edge} has an empty {end} reference")
            }
            Warning::UnknownReference {
                end,
                id,
                name,
                edge,
            } => {
                if id == name {
                    write!(f, r#"Sequence flow {edge} references unknown {end} "{id}""#)
                } else {
                    write!(
                        f,
                        r#"Sequence flow {edge} references unknown {end} "{name}" ({id})"#
                    )
                }
            }
        }
    }
}

/// Check node ids and edge references, logging one warning per problem.
pub fn validate(model: &DiagramModel) -> Vec<Warning> {
    let mut warnings = Vec::new();

    for node in model.nodes() {
        if node.node_id.is_empty() {
            warnings.push(Warning::MissingNodeId {
                name: node.name.clone(),
                node_type: node.node_type,
            });
        }
    }

    let node_ids: HashSet<&str> = model
        .nodes()
        .iter()
        .map(|node| node.node_id.as_str())
        .filter(|id| !id.is_empty())
        .collect();

    for edge in model.edges() {
        for end in [EdgeEnd::Source, EdgeEnd::Target] {
            if let Some(warning) = check_reference(model, &node_ids, edge, end) {
                warnings.push(warning);
            }
        }
    }

    for warning in warnings.iter() {
        warn!("{warning}");
    }
    warnings
}

fn check_reference(
    model: &DiagramModel,
    node_ids: &HashSet<&str>,
    edge: &FlowEdge,
    end: EdgeEnd,
) -> Option<Warning> {
    let id = match end {
        EdgeEnd::Source => edge.source_id(),
        EdgeEnd::Target => edge.target_id(),
    };
    let describe = || {
        format!(
            "{} -> {}",
            model.name_of(edge.source_id()),
            model.name_of(edge.target_id())
        )
    };

    if id.is_empty() {
        Some(Warning::EmptyReference {
            end,
            edge: describe(),
        })
    } else if !node_ids.contains(id) {
        Some(Warning::UnknownReference {
            end,
            id: id.into(),
            name: model.name_of(id).into(),
            edge: describe(),
        })
    } else {
        None
    }
}
