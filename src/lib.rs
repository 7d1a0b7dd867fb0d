//! # BPMN Print
//!
//! `bpmn-print` turns Camunda flavoured Business Process Model and Notation (BPMN) 2.0 files into PDF reports.
//!
//! - The process flow is drawn with Graphviz and placed on the first page.
//! - Conditional sequence flows are numbered on the diagram and listed with their expressions.
//! - Call activities, service tasks, input parameters and JEXL scripts are listed in tables below.
//! - Broken references in the diagram are reported as warnings, never as errors.
//!
//! The XML is parsed once per file and shared by both extractors.
//!
//! ## Example
//!
//! ### Cargo.toml
//! ```toml
//! [dependencies]
//! bpmn-print = { version = "0.4", default-features = false }
//! log = "0.4"
//! pretty_env_logger = "0.5"
//! ```
//! ### main.rs
//!
//! ```
//! use bpmn_print::{ConvertOptions, pretty_print};
//!
//! extern crate pretty_env_logger;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     pretty_env_logger::init();
//!
//!     // Convert every *.bpmn file of the folder
//!     let summary = pretty_print("processes", "reports", &ConvertOptions::default())?;
//!
//!     // Print the result.
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```

pub mod bpmn;
mod context;
mod convert;
mod data;
mod diagram;
pub mod document;
mod error;
mod render;
mod report;

pub use context::XmlContext;
pub use convert::{BpmnModels, ConvertOptions, Converter, Summary, extract, pretty_print};
pub use data::{
    ActivityNode, ActivityType, DEFAULT_INPUT_PARAM, DEFAULT_SCRIPT_PARAM, ExtractResult,
    Parameter, SCRIPT_PLACEHOLDER, Script, UNKNOWN, extract_data, find_parent_with_id,
    is_script_expression, simplify_class_name,
};
pub use diagram::{
    Condition, DiagramModel, DiagramNode, EdgeEnd, FlowEdge, Warning, extract_diagram, validate,
};
pub use error::{Error, ErrorKind, Result};
pub use render::{DiagramRenderer, Graphviz, prepare_output_path, to_dot};
pub use report::{
    Orientation, PdfReport, ReportComposer, ReportData, ReportLayout, diagram_orientation,
    truncate_value, wrap_text,
};
