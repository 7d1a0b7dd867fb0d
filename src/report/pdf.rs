use crate::{
    error::{Error, Result},
    render::prepare_output_path,
    report::{
        Orientation, ReportComposer, ReportData, ReportLayout, diagram_orientation,
        truncate_value, wrap_text,
    },
};
use log::debug;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Rect, Rgb,
    image_crate::{ImageDecoder, codecs::png::PngDecoder},
    path::PaintMode,
};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

const DEFAULT_LANDSCAPE_THRESHOLD: u32 = 2200;
const LAYER: &str = "Layer 1";

const PT_TO_MM: f32 = 25.4 / 72.0;
const IMAGE_DPI: f32 = 300.0;
const LINE_SPACING: f32 = 1.25;
const CELL_PADDING: f32 = 1.5;
const SPACER_SMALL: f32 = 1.0;
const SPACER_MEDIUM: f32 = 2.0;
const SPACER_LARGE: f32 = 4.0;
const SPACER_XLARGE: f32 = 5.0;
const SCRIPT_INDENT: f32 = 3.5;
const SCRIPT_PADDING: f32 = 2.8;
const SCRIPT_HEADING_HEIGHT: f32 = 8.0;
const GRID_THICKNESS: f32 = 1.0;
const SCRIPT_BORDER_THICKNESS: f32 = 2.0;

// Average glyph advance relative to the font size
const HELVETICA_ADVANCE: f32 = 0.5;
const COURIER_ADVANCE: f32 = 0.6;

type Rgb3 = (f32, f32, f32);
const BLACK: Rgb3 = (0.0, 0.0, 0.0);
const WHITE: Rgb3 = (1.0, 1.0, 1.0);
const GREY: Rgb3 = (0.5, 0.5, 0.5);
const WHITESMOKE: Rgb3 = (0.96, 0.96, 0.96);
const LIGHTGREY: Rgb3 = (0.83, 0.83, 0.83);
const LIGHTCYAN: Rgb3 = (0.88, 1.0, 1.0);
const LIGHTBLUE: Rgb3 = (0.68, 0.85, 0.9);
const BEIGE: Rgb3 = (0.96, 0.96, 0.86);

fn color((r, g, b): Rgb3) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn max_chars(width: f32, font_size: f32, advance: f32) -> usize {
    (width / (font_size * advance * PT_TO_MM)).floor().max(1.0) as usize
}

fn wrap_cells(cells: &[String], widths: &[f32], font_size: f32) -> Vec<Vec<String>> {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            wrap_text(cell, max_chars(width - 2.0 * CELL_PADDING, font_size, HELVETICA_ADVANCE))
        })
        .collect()
}

fn row_height(cells: &[Vec<String>], font_size: f32) -> f32 {
    let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
    lines as f32 * font_size * PT_TO_MM * LINE_SPACING + 2.0 * CELL_PADDING
}

// Text lines that fit into `height` between the cell paddings.
fn lines_fitting(height: f32, line_height: f32) -> usize {
    ((height - 2.0 * CELL_PADDING) / line_height).floor().max(0.0) as usize
}

/// A4 PDF report built with `printpdf`.
#[derive(Debug, Clone)]
pub struct PdfReport {
    layout: ReportLayout,
    landscape_threshold: u32,
}

impl Default for PdfReport {
    fn default() -> Self {
        Self::new(DEFAULT_LANDSCAPE_THRESHOLD)
    }
}

impl PdfReport {
    /// Diagrams wider than `landscape_threshold` pixels get a landscape page.
    pub fn new(landscape_threshold: u32) -> Self {
        Self {
            layout: ReportLayout::default(),
            landscape_threshold,
        }
    }

    pub fn with_layout(mut self, layout: ReportLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> &ReportLayout {
        &self.layout
    }
}

impl ReportComposer for PdfReport {
    fn compose(&self, data: &ReportData<'_>, output: &Path) -> Result<()> {
        let (doc, outline) = self.build(data, output)?;
        debug!(
            "{}: {} pages, sections {:?}",
            output.display(),
            outline.pages.len(),
            outline.headings
        );

        prepare_output_path(output)?;
        let file = File::create(output).map_err(|err| Error::report_failed(output, err))?;
        doc.save(&mut BufWriter::new(file))
            .map_err(|err| Error::report_failed(output, err))
    }
}

impl PdfReport {
    fn build(&self, data: &ReportData<'_>, output: &Path) -> Result<(PdfDocumentReference, Outline)> {
        let fail = |reason: String| Error::report_failed(output, reason);

        let diagram = DiagramImage::open(data.image)
            .map_err(|reason| fail(format!("{}: {reason}", data.image.display())))?;
        let orientation = diagram_orientation(diagram.width, self.landscape_threshold);
        debug!(
            "Diagram {}x{} px, {orientation:?} page",
            diagram.width, diagram.height
        );

        let (width, height) = self.layout.page_size(orientation);
        let (doc, page, layer) = PdfDocument::new("BPMN", Mm(width), Mm(height), LAYER);
        let fonts = Fonts::load(&doc).map_err(|err| fail(err.to_string()))?;

        let outline = {
            let mut writer = PageWriter {
                doc: &doc,
                fonts: &fonts,
                layout: &self.layout,
                layer: doc.get_page(page).get_layer(layer),
                width,
                height,
                y: height - self.layout.margin,
                outline: Outline {
                    pages: vec![orientation],
                    ..Default::default()
                },
            };

            writer.diagram(diagram);
            let has_sections = !(data.conditions.is_empty()
                && data.nodes.is_empty()
                && data.parameters.is_empty()
                && data.scripts.is_empty());
            match orientation {
                Orientation::Landscape if has_sections => writer.new_page(Orientation::Portrait),
                Orientation::Landscape => {}
                Orientation::Portrait => writer.space(SPACER_LARGE),
            }

            if !data.conditions.is_empty() {
                writer.heading("Branch Conditions");
                let rows = data
                    .conditions
                    .iter()
                    .map(|condition| vec![condition.number.to_string(), condition.expression.clone()])
                    .collect();
                writer.table(&["#", "Condition"], &self.layout.condition_columns, rows, LIGHTCYAN);
            }

            if !data.nodes.is_empty() {
                writer.heading("Nodes (Activities and Tasks)");
                let rows = data
                    .nodes
                    .iter()
                    .map(|node| {
                        vec![
                            node.name.clone(),
                            node.activity_type.to_string(),
                            node.target.clone(),
                        ]
                    })
                    .collect();
                writer.table(
                    &["Node Name", "Type", "Called Element / Class"],
                    &self.layout.node_columns,
                    rows,
                    LIGHTBLUE,
                );
            }

            if !data.parameters.is_empty() {
                writer.heading("Input Parameters");
                let rows = data
                    .parameters
                    .iter()
                    .map(|parameter| {
                        vec![
                            parameter.node_name.clone(),
                            parameter.param_name.clone(),
                            truncate_value(&parameter.value, self.layout.max_value_length),
                        ]
                    })
                    .collect();
                writer.table(
                    &["Node Name", "Parameter Name", "Value"],
                    &self.layout.parameter_columns,
                    rows,
                    BEIGE,
                );
            }

            if !data.scripts.is_empty() {
                writer.heading("JEXL Scripts");
                for script in data.scripts {
                    writer.script(
                        &format!("{} | {}", script.node_name, script.param_name),
                        &script.text,
                    );
                }
            }
            writer.outline
        };

        Ok((doc, outline))
    }
}

// What went into a document, in writing order.
#[derive(Debug, Default)]
struct Outline {
    pages: Vec<Orientation>,
    headings: Vec<String>,
    // Text lines of table bodies, header rows excluded
    table_lines: usize,
}

struct DiagramImage {
    image: Image,
    width: u32,
    height: u32,
}

impl DiagramImage {
    fn open(path: &Path) -> Result<Self, String> {
        let file = File::open(path).map_err(|err| err.to_string())?;
        let decoder = PngDecoder::new(BufReader::new(file)).map_err(|err| err.to_string())?;
        let (width, height) = decoder.dimensions();
        if width == 0 || height == 0 {
            return Err("empty image".into());
        }
        let image = Image::try_from(decoder).map_err(|err| err.to_string())?;
        Ok(Self {
            image,
            width,
            height,
        })
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    mono: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, printpdf::Error> {
        Ok(Self {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
            mono: doc.add_builtin_font(BuiltinFont::Courier)?,
        })
    }
}

// Lays out content top to bottom. `y` is the current top edge in mm from the page bottom.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    fonts: &'a Fonts,
    layout: &'a ReportLayout,
    layer: PdfLayerReference,
    width: f32,
    height: f32,
    y: f32,
    outline: Outline,
}

impl PageWriter<'_> {
    fn new_page(&mut self, orientation: Orientation) {
        let (width, height) = self.layout.page_size(orientation);
        let (page, layer) = self.doc.add_page(Mm(width), Mm(height), LAYER);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.outline.pages.push(orientation);
        self.width = width;
        self.height = height;
        self.y = height - self.layout.margin;
    }

    fn content_width(&self) -> f32 {
        self.width - 2.0 * self.layout.margin
    }

    fn at_top(&self) -> bool {
        self.y >= self.height - self.layout.margin
    }

    // Continue on a fresh portrait page unless `height` still fits.
    fn ensure(&mut self, height: f32) {
        if self.y - height < self.layout.margin && !self.at_top() {
            self.new_page(Orientation::Portrait);
        }
    }

    fn space(&mut self, height: f32) {
        self.y -= height;
    }

    fn text(&self, text: &str, font_size: f32, x: f32, top: f32, font: &IndirectFontRef) {
        let baseline = top - font_size * PT_TO_MM;
        self.layer.use_text(text, font_size, Mm(x), Mm(baseline), font);
    }

    fn rect(&self, x: f32, top: f32, width: f32, height: f32, fill: Rgb3, mode: PaintMode) {
        self.layer.set_fill_color(color(fill));
        self.layer.set_outline_color(color(BLACK));
        self.layer.set_outline_thickness(GRID_THICKNESS);
        self.layer.add_rect(
            Rect::new(Mm(x), Mm(top - height), Mm(x + width), Mm(top)).with_mode(mode),
        );
    }

    fn frame(&self, x: f32, top: f32, width: f32, height: f32) {
        self.layer.set_outline_color(color(GREY));
        self.layer.set_outline_thickness(SCRIPT_BORDER_THICKNESS);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x), Mm(top)), false),
                (Point::new(Mm(x + width), Mm(top)), false),
                (Point::new(Mm(x + width), Mm(top - height)), false),
                (Point::new(Mm(x), Mm(top - height)), false),
            ],
            is_closed: true,
        });
    }

    fn diagram(&mut self, diagram: DiagramImage) {
        let content_width = self.content_width();
        let content_height = self.height - 2.0 * self.layout.margin;
        let aspect = diagram.height as f32 / diagram.width as f32;

        let mut width = content_width;
        let mut height = width * aspect;
        let max_height = (content_width * self.layout.diagram_height_ratio).min(content_height);
        if height > max_height {
            width *= max_height / height;
            height = max_height;
        }

        let natural_width = diagram.width as f32 / IMAGE_DPI * 25.4;
        let scale = width / natural_width;
        diagram.image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(self.layout.margin)),
                translate_y: Some(Mm(self.y - height)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        self.space(height);
    }

    fn heading(&mut self, title: &str) {
        let font_size = self.layout.heading_font_size;
        let height = font_size * PT_TO_MM * LINE_SPACING;
        // Keep the heading with at least a few lines of what follows
        self.ensure(height + 4.0 * self.layout.body_font_size * PT_TO_MM * LINE_SPACING);
        self.layer.set_fill_color(color(BLACK));
        self.text(title, font_size, self.layout.margin, self.y, &self.fonts.bold);
        self.outline.headings.push(title.to_string());
        self.space(height + SPACER_MEDIUM);
    }

    fn table(&mut self, headers: &[&str], columns: &[f32], rows: Vec<Vec<String>>, background: Rgb3) {
        let widths: Vec<f32> = columns.iter().map(|pt| pt * PT_TO_MM).collect();
        let headers: Vec<String> = headers.iter().map(|header| header.to_string()).collect();
        let header = wrap_cells(&headers, &widths, self.layout.header_font_size);
        let header_height = row_height(&header, self.layout.header_font_size);

        let font_size = self.layout.body_font_size;
        let line_height = font_size * PT_TO_MM * LINE_SPACING;
        let (_, page_height) = self.layout.page_size(Orientation::Portrait);
        let page_capacity =
            lines_fitting(page_height - 2.0 * self.layout.margin - header_height, line_height);

        self.table_row(&header, &widths, true, background);
        for row in rows.iter() {
            let mut rest = wrap_cells(row, &widths, font_size);
            let mut fresh_page = false;
            loop {
                let needed = rest.iter().map(Vec::len).max().unwrap_or(0);
                let capacity = lines_fitting(self.y - self.layout.margin, line_height);
                if needed <= capacity {
                    self.table_row(&rest, &widths, false, background);
                    break;
                }
                if !fresh_page && (needed <= page_capacity || capacity == 0) {
                    // Continue on the next page below a repeated header
                    self.new_page(Orientation::Portrait);
                    self.table_row(&header, &widths, true, background);
                    fresh_page = true;
                    continue;
                }

                // Taller than a page: split every cell at the same line
                let take = capacity.max(1);
                let tail: Vec<Vec<String>> = rest
                    .iter_mut()
                    .map(|cell| cell.split_off(take.min(cell.len())))
                    .collect();
                self.table_row(&rest, &widths, false, background);
                if tail.iter().all(Vec::is_empty) {
                    break;
                }
                rest = tail;
                self.new_page(Orientation::Portrait);
                self.table_row(&header, &widths, true, background);
                fresh_page = true;
            }
        }
        self.space(SPACER_LARGE);
    }

    fn table_row(&mut self, cells: &[Vec<String>], widths: &[f32], header: bool, background: Rgb3) {
        let fonts = self.fonts;
        let (font_size, font, fill, text_color) = if header {
            (self.layout.header_font_size, &fonts.bold, GREY, WHITESMOKE)
        } else {
            (self.layout.body_font_size, &fonts.regular, background, BLACK)
        };
        let line_height = font_size * PT_TO_MM * LINE_SPACING;
        let height = row_height(cells, font_size);

        let mut x = self.layout.margin;
        for (cell_lines, width) in cells.iter().zip(widths) {
            self.rect(x, self.y, *width, height, fill, PaintMode::FillStroke);
            self.layer.set_fill_color(color(text_color));
            for (index, line) in cell_lines.iter().enumerate() {
                let top = self.y - CELL_PADDING - index as f32 * line_height;
                self.text(line, font_size, x + CELL_PADDING, top, font);
            }
            x += width;
        }
        if !header {
            self.outline.table_lines += cells.iter().map(Vec::len).max().unwrap_or(0);
        }
        self.space(height);
    }

    // Framed monospaced block, split across pages when long.
    fn script(&mut self, heading: &str, text: &str) {
        let content_width = self.content_width();
        let font_size = self.layout.script_font_size;
        let line_height = font_size * PT_TO_MM * LINE_SPACING;

        self.ensure(SCRIPT_HEADING_HEIGHT + SPACER_SMALL + line_height + 2.0 * SCRIPT_PADDING);
        self.rect(
            self.layout.margin,
            self.y,
            content_width,
            SCRIPT_HEADING_HEIGHT,
            LIGHTGREY,
            PaintMode::Fill,
        );
        self.layer.set_fill_color(color(BLACK));
        let heading_size = self.layout.header_font_size;
        let heading_top = self.y - (SCRIPT_HEADING_HEIGHT - heading_size * PT_TO_MM) / 2.0;
        self.text(
            heading,
            heading_size,
            self.layout.margin + SCRIPT_INDENT,
            heading_top,
            &self.fonts.bold,
        );
        self.space(SCRIPT_HEADING_HEIGHT + SPACER_SMALL);

        let frame_x = self.layout.margin + SCRIPT_INDENT;
        let frame_width = content_width - 2.0 * SCRIPT_INDENT;
        let lines = wrap_text(
            text,
            max_chars(frame_width - 2.0 * SCRIPT_PADDING, font_size, COURIER_ADVANCE),
        );

        let mut rest = lines.as_slice();
        while !rest.is_empty() {
            let available = ((self.y - self.layout.margin - 2.0 * SCRIPT_PADDING) / line_height)
                .floor()
                .max(0.0) as usize;
            if available == 0 {
                self.new_page(Orientation::Portrait);
                continue;
            }

            let (chunk, remaining) = rest.split_at(available.min(rest.len()));
            let height = chunk.len() as f32 * line_height + 2.0 * SCRIPT_PADDING;
            self.rect(frame_x, self.y, frame_width, height, WHITE, PaintMode::Fill);
            self.frame(frame_x, self.y, frame_width, height);
            self.layer.set_fill_color(color(BLACK));
            for (index, line) in chunk.iter().enumerate() {
                let top = self.y - SCRIPT_PADDING - index as f32 * line_height;
                self.text(line, font_size, frame_x + SCRIPT_PADDING, top, &self.fonts.mono);
            }
            self.space(height);

            rest = remaining;
            if !rest.is_empty() {
                self.new_page(Orientation::Portrait);
            }
        }
        self.space(SPACER_XLARGE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::{ActivityNode, ActivityType},
        diagram::Condition,
    };
    use printpdf::image_crate::{self, ImageFormat, RgbImage};
    use std::path::PathBuf;

    fn diagram_png(dir: &Path, width: u32, height: u32) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = dir.join(format!("{width}x{height}.png"));
        RgbImage::from_pixel(width, height, image_crate::Rgb([255, 255, 255]))
            .save_with_format(&path, ImageFormat::Png)?;
        Ok(path)
    }

    fn diagram_only(image: &Path) -> ReportData<'_> {
        ReportData {
            image,
            conditions: &[],
            nodes: &[],
            parameters: &[],
            scripts: &[],
        }
    }

    fn condition(number: u32, expression: String) -> Condition {
        Condition {
            number,
            source_name: "Gateway".into(),
            target_name: "Task".into(),
            expression,
        }
    }

    #[test]
    fn wide_diagram_gets_a_landscape_page() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let image = diagram_png(dir.path(), 2400, 300)?;
        let output = dir.path().join("wide.pdf");
        let report = PdfReport::default();

        let (_, outline) = report.build(&diagram_only(&image), &output)?;
        assert_eq!(outline.pages, [Orientation::Landscape]);
        assert!(outline.headings.is_empty());

        let nodes = [ActivityNode {
            name: "Billing".into(),
            activity_type: ActivityType::CallActivity,
            target: "billing".into(),
        }];
        let data = ReportData {
            nodes: &nodes,
            ..diagram_only(&image)
        };
        let (_, outline) = report.build(&data, &output)?;
        assert_eq!(outline.pages, [Orientation::Landscape, Orientation::Portrait]);
        assert_eq!(outline.headings, ["Nodes (Activities and Tasks)"]);
        assert_eq!(outline.table_lines, 1);
        Ok(())
    }

    #[test]
    fn empty_sections_are_left_out() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let image = diagram_png(dir.path(), 640, 200)?;
        let conditions = [condition(1, "${ ok }".into())];
        let data = ReportData {
            conditions: &conditions,
            ..diagram_only(&image)
        };

        let (_, outline) = PdfReport::new(2200).build(&data, &dir.path().join("r.pdf"))?;
        assert_eq!(outline.pages, [Orientation::Portrait]);
        assert_eq!(outline.headings, ["Branch Conditions"]);
        Ok(())
    }

    #[test]
    fn rows_taller_than_a_page_continue_on_the_next() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let image = diagram_png(dir.path(), 640, 200)?;
        let expression = "${ order.total > 1000 && customer.vip }".repeat(600);
        let conditions = [condition(1, expression.clone()), condition(2, "${ ok }".into())];
        let data = ReportData {
            conditions: &conditions,
            ..diagram_only(&image)
        };

        let report = PdfReport::default();
        let (_, outline) = report.build(&data, &dir.path().join("long.pdf"))?;

        let layout = report.layout();
        let width = layout.condition_columns[1] * PT_TO_MM - 2.0 * CELL_PADDING;
        let expected = wrap_text(
            &expression,
            max_chars(width, layout.body_font_size, HELVETICA_ADVANCE),
        )
        .len();
        assert!(expected > 150);
        // Every line of both rows is written
        assert_eq!(outline.table_lines, expected + 1);
        assert!(outline.pages.len() > 2);
        assert!(outline.pages.iter().all(|page| *page == Orientation::Portrait));
        Ok(())
    }

    #[test]
    fn lines_fitting_leaves_room_for_padding() {
        let line_height = 8.0 * PT_TO_MM * LINE_SPACING;
        assert_eq!(lines_fitting(2.0 * CELL_PADDING, line_height), 0);
        assert_eq!(lines_fitting(2.0 * CELL_PADDING + 3.5 * line_height, line_height), 3);
        assert_eq!(lines_fitting(-5.0, line_height), 0);
    }

    #[test]
    fn character_budget_follows_font_size() {
        // 8pt Courier advances 4.8pt, 1.69 mm
        assert_eq!(max_chars(16.9, 8.0, COURIER_ADVANCE), 9);
        assert_eq!(max_chars(0.0, 8.0, COURIER_ADVANCE), 1);
        assert!(max_chars(100.0, 8.0, HELVETICA_ADVANCE) > max_chars(100.0, 10.0, HELVETICA_ADVANCE));
    }

    #[test]
    fn missing_image_is_a_report_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let image = dir.path().join("missing.png");
        let output = dir.path().join("report.pdf");
        let data = ReportData {
            image: &image,
            conditions: &[],
            nodes: &[],
            parameters: &[],
            scripts: &[],
        };

        let err = PdfReport::default()
            .compose(&data, &output)
            .err()
            .ok_or("composed without an image")?;
        assert!(matches!(err, Error::ReportFailed { .. }));
        assert!(err.to_string().contains("missing.png"));
        assert!(!output.exists());
        Ok(())
    }
}
