mod extract;

pub use extract::{extract_data, find_parent_with_id};

use regex::Regex;
use std::{fmt::Display, sync::LazyLock};

/// Value shown for parameters whose content is listed with the scripts.
pub const SCRIPT_PLACEHOLDER: &str = "[See JEXL Scripts]";
/// Owner of an element that has no ancestor with an id.
pub const UNKNOWN: &str = "unknown";
/// Parameter name of a script whose parent has no `name`.
pub const DEFAULT_SCRIPT_PARAM: &str = "script";
/// Parameter name of an input parameter without `name`.
pub const DEFAULT_INPUT_PARAM: &str = "inputParameter";

// `${` or `#{` followed by whitespace. `${x}` is plain text.
static SCRIPT_EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#$]\{\s").expect("valid script expression pattern"));

/// True when `text` holds an inline scripting expression such as `${ x }`.
pub fn is_script_expression(text: &str) -> bool {
    SCRIPT_EXPRESSION.is_match(text)
}

/// Last segment of a dotted class name: `com.example.Foo` gives `Foo`.
pub fn simplify_class_name(class_name: &str) -> &str {
    class_name.rsplit('.').next().unwrap_or(class_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityType {
    CallActivity,
    ServiceTask,
}

impl Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityType::CallActivity => f.write_str("callActivity"),
            ActivityType::ServiceTask => f.write_str("serviceTask"),
        }
    }
}

/// A call activity or service task with what it invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityNode {
    pub name: String,
    pub activity_type: ActivityType,
    /// Called element for call activities, simple class name for service tasks.
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub node_name: String,
    pub param_name: String,
    pub value: String,
    pub has_script: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub text: String,
    pub node_name: String,
    pub param_name: String,
}

/// Everything listed in the report tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractResult {
    pub nodes: Vec<ActivityNode>,
    pub parameters: Vec<Parameter>,
    pub scripts: Vec<Script>,
}

impl ExtractResult {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.parameters.is_empty() && self.scripts.is_empty()
    }
}
