use crate::{
    bpmn::{NodeStyle, edge_style},
    diagram::DiagramModel,
    error::{Error, Result},
};
use log::debug;
use std::{
    fmt::Write as _,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

/// Turns a diagram model into an image file.
pub trait DiagramRenderer {
    /// Render `model` to `output` and return the path of the written image.
    fn render(&self, model: &DiagramModel, output: &Path) -> Result<PathBuf>;
}

/// Renders PNG images with the Graphviz `dot` executable.
#[derive(Debug, Clone)]
pub struct Graphviz {
    executable: PathBuf,
}

impl Default for Graphviz {
    fn default() -> Self {
        Self::new("dot")
    }
}

impl Graphviz {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

impl DiagramRenderer for Graphviz {
    fn render(&self, model: &DiagramModel, output: &Path) -> Result<PathBuf> {
        prepare_output_path(output)?;
        let dot = to_dot(model);
        debug!("Rendering {} with {}", output.display(), self.executable.display());

        let mut child = Command::new(&self.executable)
            .arg("-Tpng")
            .arg("-o")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => Error::render_failed(
                    output,
                    format!(
                        "Graphviz executable '{}' not found",
                        self.executable.display()
                    ),
                ),
                _ => Error::render_failed(output, err),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(dot.as_bytes())
                .map_err(|err| Error::render_failed(output, err))?;
        }

        let result = child
            .wait_with_output()
            .map_err(|err| Error::render_failed(output, err))?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::render_failed(
                output,
                format!("Graphviz failed ({}): {}", result.status, stderr.trim()),
            ));
        }
        Ok(output.to_path_buf())
    }
}

/// Create the parent directory of `output` when missing.
pub fn prepare_output_path(output: &Path) -> Result<&Path> {
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|err| Error::output_dir(parent, err))?;
    }
    Ok(output)
}

/// Graphviz source for `model`: left to right, polyline edges.
pub fn to_dot(model: &DiagramModel) -> String {
    let mut dot = String::from("digraph {\n    rankdir=LR;\n    splines=polyline;\n");

    for node in model.nodes() {
        let style = &node.node_type.config().style;
        let _ = writeln!(
            dot,
            "    {} [label={}, {}];",
            quote(&node.node_id),
            quote(&node.name),
            node_attributes(style)
        );
    }

    for edge in model.edges() {
        let _ = write!(
            dot,
            "    {} -> {}",
            quote(edge.source_id()),
            quote(edge.target_id())
        );
        match (edge.label(), edge.condition_number()) {
            (Some(label), Some(_)) => {
                let _ = write!(
                    dot,
                    " [label={}, fontsize={}, fontcolor={}]",
                    quote(label),
                    edge_style::CONDITION_FONT_SIZE,
                    edge_style::CONDITION_FONT_COLOR
                );
            }
            (Some(label), None) => {
                let _ = write!(
                    dot,
                    " [label={}, fontsize={}]",
                    quote(label),
                    edge_style::FLOW_NAME_FONT_SIZE
                );
            }
            _ => {}
        }
        dot.push_str(";\n");
    }

    dot.push_str("}\n");
    dot
}

fn node_attributes(style: &NodeStyle) -> String {
    let mut attributes = vec![
        format!("shape={}", style.shape),
        format!("style={}", quote(style.style)),
        format!("fillcolor={}", style.fill_color),
    ];
    if let Some(pen_width) = style.pen_width {
        attributes.push(format!("penwidth={pen_width}"));
    }
    if let Some((width, height)) = style.size {
        attributes.push(format!("width={width}, height={height}, fixedsize=true"));
    }
    attributes.join(", ")
}

fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => {}
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}
