//! Puts one page template on paper.
//!
//! A sheet is the template plus three things: an optional student
//! identifier, the reveal flag, and the header line. Rendering never
//! touches anything else, so two calls with the same arguments produce the
//! same page.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use log::debug;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Polygon,
    Rgb,
};

use crate::layout::Layout;
use crate::status::{SheetError, SheetResult};
use crate::utils::{labels, Rect_, PT_PER_MM};

/// Header line printed at the top of every sheet.
#[derive(Debug, Clone, Default)]
pub struct HeaderMeta {
    pub course: String,
    pub professor: String,
    pub date: String,
}

const COURSE_PT: f32 = 14.0;
const HEADER_PT: f32 = 12.0;
const TITLE_PT: f32 = 26.0;
const QLABEL_PT: f32 = 14.0;
const OPTION_PT: f32 = 12.0;

/// Renders one sheet of `layout` into `path`.
///
/// With `reveal` set, each question's correct box is filled solid. That is
/// the only difference between the solution sheet and a student sheet.
pub fn render_sheet(
    path: &Path,
    layout: &Layout,
    student_id: Option<&str>,
    reveal: bool,
    header: &HeaderMeta,
) -> SheetResult<()> {
    let page = layout.page;
    let (doc, page_idx, layer_idx) = PdfDocument::new(
        layout.title.as_str(),
        mm(page.width),
        mm(page.height),
        "Layer 1",
    );
    let layer = doc.get_page(page_idx).get_layer(layer_idx);

    let times = doc
        .add_builtin_font(BuiltinFont::TimesRoman)
        .map_err(pdf_err)?;
    let times_bold = doc
        .add_builtin_font(BuiltinFont::TimesBold)
        .map_err(pdf_err)?;

    let margin = layout.marker.margin;
    layer.set_fill_color(black());
    layer.set_outline_color(black());
    layer.set_outline_thickness(1.0);

    draw_markers(&layer, page.width, page.height, margin, layout.marker.size);

    // Header band below the markers, rule underneath.
    let header_y = (page.height - margin) - layout.marker.size - 6.0 * PT_PER_MM;
    if !header.course.is_empty() {
        layer.use_text(
            header.course.as_str(),
            COURSE_PT,
            mm(margin),
            mm(header_y),
            &times_bold,
        );
    }
    if !header.professor.is_empty() {
        text_right(
            &layer,
            &header.professor,
            HEADER_PT,
            page.width - margin,
            header_y,
            &times,
        );
    }
    text_right(
        &layer,
        &header.date,
        HEADER_PT,
        page.width - margin,
        header_y - 12.0,
        &times,
    );

    let rule_y = header_y - 18.0;
    draw_hline(&layer, margin, page.width - margin, rule_y);

    let title_y = rule_y - 28.0;
    text_centered(
        &layer,
        &layout.title,
        TITLE_PT,
        page.width / 2.0,
        title_y,
        &times_bold,
    );

    if let Some(sid) = student_id {
        layer.use_text(
            format!("Student ID: {}", sid),
            COURSE_PT,
            mm(margin),
            mm(title_y - 18.0),
            &times_bold,
        );
    }

    for q in 1..=layout.num_questions {
        let boxes: Vec<_> = layout.boxes_of(q).collect();
        let first = match boxes.first() {
            Some(b) => *b,
            None => continue,
        };

        let qlabel = if layout.prefix.is_empty() {
            format!("Q {}", q)
        } else {
            format!("Q {}.{}", layout.prefix, q)
        };
        layer.use_text(
            qlabel,
            QLABEL_PT,
            mm(first.rect.x),
            mm(first.rect.top() + 2.5 * PT_PER_MM),
            &times_bold,
        );

        for b in boxes {
            stroke_rect(&layer, &b.rect);
            if reveal && layout.key.get(q - 1) == Some(&b.opt) {
                fill_rect(&layer, &b.rect);
            }
            layer.use_text(
                format!("({})", labels::label(b.opt)),
                OPTION_PT,
                mm(b.rect.right() + layout.geometry.label_gap),
                mm(b.rect.y + 0.5 * PT_PER_MM),
                &times,
            );
        }
    }

    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file)).map_err(pdf_err)?;
    debug!("rendered {}", path.display());
    Ok(())
}

fn pdf_err(e: impl std::fmt::Display) -> SheetError {
    SheetError::Pdf(e.to_string())
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

/// Points to printpdf millimeters.
fn mm(v_pt: f64) -> Mm {
    Mm((v_pt / PT_PER_MM) as f32)
}

/// Rough advance width of `text` at `size`, in points. The builtin fonts
/// ship without metrics; a flat average per glyph is close enough to place
/// short right-aligned and centered header strings.
fn text_width_pt(text: &str, size: f32) -> f64 {
    text.chars().count() as f64 * size as f64 * 0.5
}

fn text_right(
    layer: &PdfLayerReference,
    text: &str,
    size: f32,
    right_x: f64,
    y: f64,
    font: &IndirectFontRef,
) {
    layer.use_text(text, size, mm(right_x - text_width_pt(text, size)), mm(y), font);
}

fn text_centered(
    layer: &PdfLayerReference,
    text: &str,
    size: f32,
    center_x: f64,
    y: f64,
    font: &IndirectFontRef,
) {
    let x = center_x - text_width_pt(text, size) / 2.0;
    layer.use_text(text, size, mm(x), mm(y), font);
}

fn draw_hline(layer: &PdfLayerReference, x1: f64, x2: f64, y: f64) {
    let line = Line {
        points: vec![
            (Point::new(mm(x1), mm(y)), false),
            (Point::new(mm(x2), mm(y)), false),
        ],
        is_closed: false,
    };
    layer.add_line(line);
}

fn rect_ring(rect: &Rect_<f64>) -> Vec<(Point, bool)> {
    vec![
        (Point::new(mm(rect.x), mm(rect.y)), false),
        (Point::new(mm(rect.right()), mm(rect.y)), false),
        (Point::new(mm(rect.right()), mm(rect.top())), false),
        (Point::new(mm(rect.x), mm(rect.top())), false),
    ]
}

fn stroke_rect(layer: &PdfLayerReference, rect: &Rect_<f64>) {
    layer.add_polygon(Polygon {
        rings: vec![rect_ring(rect)],
        mode: PaintMode::Stroke,
        winding_order: WindingOrder::NonZero,
    });
}

fn fill_rect(layer: &PdfLayerReference, rect: &Rect_<f64>) {
    layer.add_polygon(Polygon {
        rings: vec![rect_ring(rect)],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    });
}

/// The four filled squares every scan is registered against. Positions are
/// a pure function of the margin and marker size, never of the content.
fn draw_markers(layer: &PdfLayerReference, w: f64, h: f64, margin: f64, size: f64) {
    for (x, y) in [
        (margin, margin),
        (w - margin - size, margin),
        (margin, h - margin - size),
        (w - margin - size, h - margin - size),
    ] {
        fill_rect(
            layer,
            &Rect_ {
                x,
                y,
                width: size,
                height: size,
            },
        );
    }
}
