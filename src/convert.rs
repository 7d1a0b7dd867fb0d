use crate::{
    context::XmlContext,
    data::{ExtractResult, extract_data},
    diagram::{DiagramModel, Warning, extract_diagram, validate},
    error::{Error, Result},
    render::{DiagramRenderer, Graphviz},
    report::{PdfReport, ReportComposer, ReportData},
};
use log::{info, warn};
use std::{
    ffi::OsStr,
    fmt::Display,
    fs,
    path::{Path, PathBuf},
};

const BPMN_EXTENSION: &str = "bpmn";
const PDF_EXTENSION: &str = "pdf";
const PNG_EXTENSION: &str = "png";

/// Conversion settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Keep the rendered diagram next to the PDF.
    pub keep_png: bool,
    /// Diagram width in pixels above which the diagram page is landscape.
    pub landscape_threshold: u32,
    /// Graphviz `dot` executable.
    pub dot: PathBuf,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            keep_png: false,
            landscape_threshold: 2200,
            dot: "dot".into(),
        }
    }
}

/// Both models of one BPMN file plus the diagram warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BpmnModels {
    pub diagram: DiagramModel,
    pub data: ExtractResult,
    pub warnings: Vec<Warning>,
}

/// Extract and validate everything the report needs from `context`.
pub fn extract(context: &XmlContext) -> BpmnModels {
    let diagram = extract_diagram(context);
    let warnings = validate(&diagram);
    let data = extract_data(context);
    BpmnModels {
        diagram,
        data,
        warnings,
    }
}

/// Outcome of a folder conversion.
#[derive(Debug, Default)]
pub struct Summary {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, Error)>,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} converted, {} failed",
            self.converted.len(),
            self.failed.len()
        )?;
        for (path, error) in self.failed.iter() {
            write!(f, "\n  {}: {error}", path.display())?;
        }
        Ok(())
    }
}

/// Renders the diagram and composes the report of BPMN files.
pub struct Converter<R = Graphviz, C = PdfReport> {
    renderer: R,
    composer: C,
    keep_png: bool,
}

impl Converter {
    pub fn new(options: &ConvertOptions) -> Self {
        Self {
            renderer: Graphviz::new(&options.dot),
            composer: PdfReport::new(options.landscape_threshold),
            keep_png: options.keep_png,
        }
    }
}

impl<R: DiagramRenderer, C: ReportComposer> Converter<R, C> {
    pub fn with_parts(renderer: R, composer: C, keep_png: bool) -> Self {
        Self {
            renderer,
            composer,
            keep_png,
        }
    }

    /// Convert one BPMN file. The XML is parsed once for both models.
    pub fn convert(&self, bpmn_file: &Path, pdf_path: &Path, png_file: &Path) -> Result<BpmnModels> {
        let context = XmlContext::load(bpmn_file)?;
        let models = extract(&context);

        let image = self.renderer.render(&models.diagram, png_file)?;
        let data = ReportData {
            image: &image,
            conditions: models.diagram.conditions(),
            nodes: &models.data.nodes,
            parameters: &models.data.parameters,
            scripts: &models.data.scripts,
        };
        let composed = self.composer.compose(&data, pdf_path);

        if !self.keep_png
            && image.exists()
            && let Err(err) = fs::remove_file(&image)
        {
            warn!("Could not remove PNG file {}: {err}", image.display());
        }

        composed.map(|_| models)
    }

    /// Convert every `*.bpmn` file of `input_folder` into a PDF of the same name in `output_folder`.
    ///
    /// A failing file is recorded in the [`Summary`] and the next file is processed.
    pub fn pretty_print(&self, input_folder: &Path, output_folder: &Path) -> Result<Summary> {
        fs::create_dir_all(output_folder).map_err(|err| Error::output_dir(output_folder, err))?;

        let bpmn_files = bpmn_files(input_folder)?;
        let mut summary = Summary::default();
        if bpmn_files.is_empty() {
            info!("No BPMN files found in {}", input_folder.display());
            return Ok(summary);
        }
        info!("Found {} BPMN file(s) to process", bpmn_files.len());

        for bpmn_file in bpmn_files {
            let Some(stem) = bpmn_file.file_stem() else {
                continue;
            };
            let pdf_path = output_file(output_folder, stem, PDF_EXTENSION);
            let png_file = output_file(output_folder, stem, PNG_EXTENSION);

            info!("Processing {}...", bpmn_file.display());
            match self.convert(&bpmn_file, &pdf_path, &png_file) {
                Ok(_) => {
                    info!("Generated {}", pdf_path.display());
                    summary.converted.push(pdf_path);
                }
                Err(err) => {
                    log::error!("{err}");
                    summary.failed.push((bpmn_file, err));
                }
            }
        }
        Ok(summary)
    }
}

/// Convert a folder with Graphviz and the PDF report.
pub fn pretty_print(
    input_folder: impl AsRef<Path>,
    output_folder: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Result<Summary> {
    Converter::new(options).pretty_print(input_folder.as_ref(), output_folder.as_ref())
}

// Appends the extension, `order.v2` keeps its `.v2`.
fn output_file(output_folder: &Path, stem: &OsStr, extension: &str) -> PathBuf {
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(extension);
    output_folder.join(name)
}

// Sorted by file name.
fn bpmn_files(input_folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(input_folder).map_err(|err| Error::not_readable(input_folder, err))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| Error::not_readable(input_folder, err))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == BPMN_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    static BPMN: &str = r#"<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL"
        xmlns:camunda="http://camunda.org/schema/1.0/bpmn">
      <bpmn:process id="p">
        <bpmn:startEvent id="s"/>
        <bpmn:sequenceFlow id="f1" sourceRef="s" targetRef="st"/>
        <bpmn:serviceTask id="st" name="Approve" camunda:class="com.example.Approve">
          <bpmn:extensionElements>
            <camunda:inputOutput>
              <camunda:inputParameter name="x">${ execution.getVariable('x') }</camunda:inputParameter>
            </camunda:inputOutput>
          </bpmn:extensionElements>
        </bpmn:serviceTask>
        <bpmn:sequenceFlow id="f2" sourceRef="st" targetRef="nowhere"/>
      </bpmn:process>
    </bpmn:definitions>"#;

    struct FakeRenderer;

    impl DiagramRenderer for FakeRenderer {
        fn render(&self, model: &DiagramModel, output: &Path) -> Result<PathBuf> {
            fs::write(output, format!("{} nodes", model.nodes().len()))
                .map_err(|err| Error::render_failed(output, err))?;
            Ok(output.to_path_buf())
        }
    }

    #[derive(Default)]
    struct FakeComposer {
        composed: RefCell<Vec<(PathBuf, usize, usize, usize)>>,
    }

    impl ReportComposer for FakeComposer {
        fn compose(&self, data: &ReportData<'_>, output: &Path) -> Result<()> {
            assert!(data.image.exists());
            fs::write(output, "pdf").map_err(|err| Error::report_failed(output, err))?;
            self.composed.borrow_mut().push((
                output.to_path_buf(),
                data.nodes.len(),
                data.parameters.len(),
                data.scripts.len(),
            ));
            Ok(())
        }
    }

    #[test]
    fn converts_one_file_and_removes_png() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let bpmn = dir.path().join("order.bpmn");
        fs::write(&bpmn, BPMN)?;
        let pdf = dir.path().join("order.pdf");
        let png = dir.path().join("order.png");

        let converter = Converter::with_parts(FakeRenderer, FakeComposer::default(), false);
        let models = converter.convert(&bpmn, &pdf, &png)?;

        assert!(pdf.exists());
        assert!(!png.exists());
        assert_eq!(models.diagram.nodes().len(), 2);
        // f2 points at an undeclared node
        assert_eq!(models.warnings.len(), 1);
        assert_eq!(
            converter.composer.composed.borrow().as_slice(),
            [(pdf.clone(), 1, 1, 1)]
        );
        Ok(())
    }

    #[test]
    fn keeps_png_on_request() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let bpmn = dir.path().join("order.bpmn");
        fs::write(&bpmn, BPMN)?;
        let png = dir.path().join("order.png");

        Converter::with_parts(FakeRenderer, FakeComposer::default(), true).convert(
            &bpmn,
            &dir.path().join("order.pdf"),
            &png,
        )?;
        assert!(png.exists());
        Ok(())
    }

    #[test]
    fn folder_conversion_continues_after_failures() -> Result<(), Box<dyn std::error::Error>> {
        let input = tempfile::tempdir()?;
        let output = tempfile::tempdir()?;
        let out_folder = output.path().join("reports");
        fs::write(input.path().join("b.bpmn"), BPMN)?;
        fs::write(input.path().join("a.bpmn"), "<definitions>")?;
        fs::write(input.path().join("notes.txt"), "skip me")?;

        let converter = Converter::with_parts(FakeRenderer, FakeComposer::default(), false);
        let summary = converter.pretty_print(input.path(), &out_folder)?;

        assert!(!summary.is_success());
        assert_eq!(summary.converted, [out_folder.join("b.pdf")]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, input.path().join("a.bpmn"));
        assert!(matches!(summary.failed[0].1, Error::InvalidXml { .. }));
        assert!(summary.to_string().starts_with("1 converted, 1 failed"));
        Ok(())
    }

    #[test]
    fn dotted_file_names_keep_their_stem() -> Result<(), Box<dyn std::error::Error>> {
        let input = tempfile::tempdir()?;
        let output = tempfile::tempdir()?;
        fs::write(input.path().join("order.v1.bpmn"), BPMN)?;
        fs::write(input.path().join("order.v2.bpmn"), BPMN)?;

        let converter = Converter::with_parts(FakeRenderer, FakeComposer::default(), true);
        let summary = converter.pretty_print(input.path(), output.path())?;

        assert!(summary.is_success());
        assert_eq!(
            summary.converted,
            [
                output.path().join("order.v1.pdf"),
                output.path().join("order.v2.pdf"),
            ]
        );
        for name in ["order.v1.pdf", "order.v2.pdf", "order.v1.png", "order.v2.png"] {
            assert!(output.path().join(name).is_file(), "{name} missing");
        }
        assert!(!output.path().join("order.pdf").exists());
        Ok(())
    }

    #[test]
    fn empty_folder_is_a_success() -> Result<(), Box<dyn std::error::Error>> {
        let input = tempfile::tempdir()?;
        let output = tempfile::tempdir()?;
        let converter = Converter::with_parts(FakeRenderer, FakeComposer::default(), false);
        let summary = converter.pretty_print(input.path(), output.path())?;
        assert!(summary.is_success());
        assert!(summary.converted.is_empty());
        Ok(())
    }

    #[test]
    fn unreadable_input_folder() -> Result<(), Box<dyn std::error::Error>> {
        let output = tempfile::tempdir()?;
        let missing = output.path().join("missing");
        let err = Converter::with_parts(FakeRenderer, FakeComposer::default(), false)
            .pretty_print(&missing, output.path())
            .err()
            .ok_or("listed a missing folder")?;
        assert!(matches!(err, Error::NotReadable { .. }));
        Ok(())
    }
}
