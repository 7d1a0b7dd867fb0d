use crate::{
    bpmn::{
        ATTR_ID, ATTR_NAME, ATTR_SOURCE_REF, ATTR_TARGET_REF, CONDITION_EXPRESSION, NODE_TYPES,
        NodeTypeConfig, SEQUENCE_FLOW,
    },
    context::XmlContext,
    diagram::{DiagramModel, DiagramNode, FlowEdge},
    document::{Document, Element},
};
use log::debug;

/// Build the diagram model of `context`. Not validated yet.
pub fn extract_diagram(context: &XmlContext) -> DiagramModel {
    let document = context.document();
    let nodes = extract_nodes(document);
    let edges = extract_edges(document);
    debug!(
        "{}: {} nodes, {} sequence flows",
        context.path().display(),
        nodes.len(),
        edges.len()
    );
    DiagramModel::new(nodes, edges, context.id_to_name().clone())
}

// Table order first, then document order within a type.
fn extract_nodes(document: &Document) -> Vec<DiagramNode> {
    NODE_TYPES
        .iter()
        .flat_map(|config| {
            document
                .select(config.selector)
                .map(move |(_, element)| diagram_node(config, element))
        })
        .collect()
}

fn diagram_node(config: &NodeTypeConfig, element: &Element) -> DiagramNode {
    let node_id = element.attribute(ATTR_ID).unwrap_or_default();
    let name = element
        .attribute(ATTR_NAME)
        .or(config.default_name)
        .unwrap_or(node_id);
    DiagramNode {
        node_id: node_id.into(),
        name: name.into(),
        node_type: config.node_type,
    }
}

// Conditions are numbered from 1 across the whole document.
fn extract_edges(document: &Document) -> Vec<FlowEdge> {
    let (edges, _) = document.select(SEQUENCE_FLOW).fold(
        (Vec::new(), 1),
        |(mut edges, next_number), (flow_id, flow)| {
            let source_id = flow.attribute(ATTR_SOURCE_REF).unwrap_or_default();
            let target_id = flow.attribute(ATTR_TARGET_REF).unwrap_or_default();
            let condition = document
                .find(flow_id, CONDITION_EXPRESSION)
                .and_then(|(_, expression)| expression.text())
                .map(str::trim)
                .filter(|expression| !expression.is_empty());

            let next_number = match condition {
                Some(expression) => {
                    edges.push(FlowEdge::conditional(
                        source_id,
                        target_id,
                        expression,
                        next_number,
                    ));
                    next_number + 1
                }
                None => {
                    let label = flow
                        .attribute(ATTR_NAME)
                        .filter(|name| !name.is_empty())
                        .map(String::from);
                    edges.push(FlowEdge::new(source_id, target_id, label));
                    next_number
                }
            };
            (edges, next_number)
        },
    );
    edges
}
