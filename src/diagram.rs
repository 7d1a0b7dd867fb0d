mod extract;
mod validate;

pub use extract::extract_diagram;
pub use validate::{EdgeEnd, Warning, validate};

use crate::bpmn::NodeType;
use std::{collections::HashMap, fmt::Display};

/// A drawable BPMN element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramNode {
    /// Empty when the element carries no `id`.
    pub node_id: String,
    pub name: String,
    pub node_type: NodeType,
}

impl Display for DiagramNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.node_type, self.name, self.node_id)
    }
}

/// A sequence flow. A condition number is present exactly when a condition expression is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEdge {
    source_id: String,
    target_id: String,
    label: Option<String>,
    condition: Option<(String, u32)>,
}

impl FlowEdge {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        label: Option<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            label,
            condition: None,
        }
    }

    /// Conditional flow labelled `[number]`.
    pub fn conditional(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        expression: impl Into<String>,
        number: u32,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            label: Some(format!("[{number}]")),
            condition: Some((expression.into(), number)),
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn condition_expr(&self) -> Option<&str> {
        self.condition.as_ref().map(|(expression, _)| expression.as_str())
    }

    pub fn condition_number(&self) -> Option<u32> {
        self.condition.as_ref().map(|(_, number)| *number)
    }
}

impl Display for FlowEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.source_id, self.target_id)?;
        if let Some(label) = &self.label {
            write!(f, " {label}")?;
        }
        Ok(())
    }
}

/// Conditional branch as listed in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub number: u32,
    pub source_name: String,
    pub target_name: String,
    pub expression: String,
}

/// Nodes and edges of one BPMN file. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramModel {
    nodes: Vec<DiagramNode>,
    edges: Vec<FlowEdge>,
    id_to_name: HashMap<String, String>,
    conditions: Vec<Condition>,
}

impl DiagramModel {
    pub fn new(
        nodes: Vec<DiagramNode>,
        edges: Vec<FlowEdge>,
        id_to_name: HashMap<String, String>,
    ) -> Self {
        let conditions = edges
            .iter()
            .filter_map(|edge| {
                let (expression, number) = edge.condition.as_ref()?;
                Some(Condition {
                    number: *number,
                    source_name: name_or_id(&id_to_name, &edge.source_id).into(),
                    target_name: name_or_id(&id_to_name, &edge.target_id).into(),
                    expression: expression.clone(),
                })
            })
            .collect();

        Self {
            nodes,
            edges,
            id_to_name,
            conditions,
        }
    }

    pub fn nodes(&self) -> &[DiagramNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    pub fn id_to_name(&self) -> &HashMap<String, String> {
        &self.id_to_name
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        name_or_id(&self.id_to_name, id)
    }
}

fn name_or_id<'a>(id_to_name: &'a HashMap<String, String>, id: &'a str) -> &'a str {
    id_to_name.get(id).map_or(id, String::as_str)
}
