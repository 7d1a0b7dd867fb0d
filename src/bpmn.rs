use crate::document::Element;
use std::fmt::Display;

pub const BPMN_NS: &str = "http://www.omg.org/spec/BPMN/20100524/MODEL";
pub const CAMUNDA_NS: &str = "http://camunda.org/schema/1.0/bpmn";

pub(crate) const ATTR_ID: &str = "id";
pub(crate) const ATTR_NAME: &str = "name";
pub(crate) const ATTR_SOURCE_REF: &str = "sourceRef";
pub(crate) const ATTR_TARGET_REF: &str = "targetRef";
pub(crate) const ATTR_CALLED_ELEMENT: &str = "calledElement";
pub(crate) const ATTR_CLASS: &str = "class";

pub(crate) const SEQUENCE_FLOW: Selector = Selector::bpmn("sequenceFlow");
pub(crate) const CONDITION_EXPRESSION: Selector = Selector::bpmn("conditionExpression");
pub(crate) const CALL_ACTIVITY: Selector = Selector::bpmn("callActivity");
pub(crate) const SERVICE_TASK: Selector = Selector::bpmn("serviceTask");
pub(crate) const CAMUNDA_SCRIPT: Selector = Selector::camunda("script");
pub(crate) const CAMUNDA_INPUT_PARAMETER: Selector = Selector::camunda("inputParameter");

/// Matches elements by namespace URI and local name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selector {
    pub namespace: &'static str,
    pub local_name: &'static str,
}

impl Selector {
    pub const fn bpmn(local_name: &'static str) -> Self {
        Self {
            namespace: BPMN_NS,
            local_name,
        }
    }

    pub const fn camunda(local_name: &'static str) -> Self {
        Self {
            namespace: CAMUNDA_NS,
            local_name,
        }
    }

    pub fn matches(&self, element: &Element) -> bool {
        element.local_name() == self.local_name && element.namespace() == Some(self.namespace)
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local_name)
    }
}

/// BPMN elements drawn in the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    StartEvent,
    EndEvent,
    Task,
    ServiceTask,
    CallActivity,
    ExclusiveGateway,
    ParallelGateway,
}

impl NodeType {
    /// Entry of [`NODE_TYPES`] for this type.
    pub fn config(&self) -> &'static NodeTypeConfig {
        let index = match self {
            NodeType::StartEvent => 0,
            NodeType::EndEvent => 1,
            NodeType::Task => 2,
            NodeType::ServiceTask => 3,
            NodeType::CallActivity => 4,
            NodeType::ExclusiveGateway => 5,
            NodeType::ParallelGateway => 6,
        };
        &NODE_TYPES[index]
    }

    pub fn as_str(&self) -> &'static str {
        self.config().selector.local_name
    }
}

impl Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering hints. The extractors never read these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStyle {
    pub shape: &'static str,
    pub style: &'static str,
    pub fill_color: &'static str,
    pub pen_width: Option<&'static str>,
    // width, height in inches. Fixed size when set.
    pub size: Option<(&'static str, &'static str)>,
}

const EVENT_SIZE: Option<(&str, &str)> = Some(("0.6", "0.6"));

#[derive(Debug)]
pub struct NodeTypeConfig {
    pub node_type: NodeType,
    pub selector: Selector,
    /// Display name when the element has no `name`. `None` falls back to the id.
    pub default_name: Option<&'static str>,
    pub style: NodeStyle,
}

/// One entry per diagram node type, in extraction order.
pub static NODE_TYPES: [NodeTypeConfig; 7] = [
    NodeTypeConfig {
        node_type: NodeType::StartEvent,
        selector: Selector::bpmn("startEvent"),
        default_name: Some("Start"),
        style: NodeStyle {
            shape: "circle",
            style: "filled",
            fill_color: "lightgreen",
            pen_width: None,
            size: EVENT_SIZE,
        },
    },
    NodeTypeConfig {
        node_type: NodeType::EndEvent,
        selector: Selector::bpmn("endEvent"),
        default_name: Some("End"),
        style: NodeStyle {
            shape: "doublecircle",
            style: "filled",
            fill_color: "lightcoral",
            pen_width: None,
            size: EVENT_SIZE,
        },
    },
    NodeTypeConfig {
        node_type: NodeType::Task,
        selector: Selector::bpmn("task"),
        default_name: None,
        style: NodeStyle {
            shape: "box",
            style: "rounded,filled",
            fill_color: "lightyellow",
            pen_width: None,
            size: None,
        },
    },
    NodeTypeConfig {
        node_type: NodeType::ServiceTask,
        selector: SERVICE_TASK,
        default_name: None,
        style: NodeStyle {
            shape: "box",
            style: "rounded,filled",
            fill_color: "lightblue",
            pen_width: Some("2"),
            size: None,
        },
    },
    NodeTypeConfig {
        node_type: NodeType::CallActivity,
        selector: CALL_ACTIVITY,
        default_name: None,
        style: NodeStyle {
            shape: "box",
            style: "rounded,filled,bold",
            fill_color: "wheat",
            pen_width: Some("3"),
            size: None,
        },
    },
    NodeTypeConfig {
        node_type: NodeType::ExclusiveGateway,
        selector: Selector::bpmn("exclusiveGateway"),
        default_name: Some("X"),
        style: NodeStyle {
            shape: "diamond",
            style: "filled",
            fill_color: "yellow",
            pen_width: None,
            size: None,
        },
    },
    NodeTypeConfig {
        node_type: NodeType::ParallelGateway,
        selector: Selector::bpmn("parallelGateway"),
        default_name: Some("+"),
        style: NodeStyle {
            shape: "diamond",
            style: "filled",
            fill_color: "orange",
            pen_width: None,
            size: None,
        },
    },
];

/// Label styling for sequence flows.
pub mod edge_style {
    pub const CONDITION_FONT_SIZE: &str = "11";
    pub const CONDITION_FONT_COLOR: &str = "red";
    pub const FLOW_NAME_FONT_SIZE: &str = "10";
}
