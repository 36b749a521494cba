// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Monthly activity report as an A4 PDF. Layout runs in points from the top
//! of the page against the bundled DejaVu Sans metrics; `printpdf` then paints
//! the marks with both faces embedded, so diacritics survive intact.

use anyhow::{Context, Result, anyhow};
use image::GenericImageView;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Polygon,
};
use std::path::Path;
use time::Month;
use time::macros::format_description;
use timelog_app::stats::WorkhourStats;
use tracing::{debug, warn};
use ttf_parser::{Face, GlyphId};

use crate::{MailReportMeta, format_amount};

const REGULAR_TTF: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
const BOLD_TTF: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");

const REPORT_TITLE: &str = "Raport de activitate";
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 42.5;
const BOTTOM_LIMIT: f32 = PAGE_HEIGHT - 56.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const COLUMN_WIDTH: f32 = CONTENT_WIDTH / 4.0;
const HEADER_HEIGHT: f32 = 20.0;
const ROW_HEIGHT: f32 = 17.0;
const SIGNATURE_BOX_HEIGHT: f32 = 85.0;
const MAX_IMAGE_SIDE: u32 = 600;
const IMAGE_DPI: f32 = 300.0;
const MM_PER_PT: f32 = 25.4 / 72.0;

const TABLE_HEADERS: [&str; 4] = ["Data", "Proiect", "Descriere", "Ore lucrate"];

const DARK_BLUE: Rgb = Rgb(54, 69, 92);
const LIGHT_BLUE: Rgb = Rgb(207, 226, 243);
const WHITE: Rgb = Rgb(255, 255, 255);
const BLACK: Rgb = Rgb(0, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rgb(u8, u8, u8);

impl Rgb {
    fn color(self) -> Color {
        Color::Rgb(printpdf::Rgb::new(
            f32::from(self.0) / 255.0,
            f32::from(self.1) / 255.0,
            f32::from(self.2) / 255.0,
            None,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    const fn data(self) -> &'static [u8] {
        match self {
            Self::Regular => REGULAR_TTF,
            Self::Bold => BOLD_TTF,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Regular => "DejaVu Sans",
            Self::Bold => "DejaVu Sans Bold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

/// Advance widths of the two bundled faces.
struct Metrics {
    regular: Face<'static>,
    bold: Face<'static>,
}

impl Metrics {
    fn bundled() -> Result<Self> {
        Ok(Self {
            regular: parse_face(Font::Regular)?,
            bold: parse_face(Font::Bold)?,
        })
    }

    fn face(&self, font: Font) -> &Face<'static> {
        match font {
            Font::Regular => &self.regular,
            Font::Bold => &self.bold,
        }
    }

    fn text_width(&self, font: Font, text: &str, size: f32) -> f32 {
        let face = self.face(font);
        let units: f32 = text
            .chars()
            .map(|ch| {
                // Unmapped characters render as .notdef, glyph 0.
                let glyph = face.glyph_index(ch).unwrap_or(GlyphId(0));
                face.glyph_hor_advance(glyph).map_or(0.0, f32::from)
            })
            .sum();
        units / f32::from(face.units_per_em()) * size
    }

    /// Cuts `text` so it fits `max_width`, marking the cut with `..`.
    fn fit_text(&self, font: Font, text: &str, max_width: f32, size: f32) -> String {
        if self.text_width(font, text, size) <= max_width {
            return text.to_owned();
        }
        let budget = max_width - self.text_width(font, "..", size);
        let mut fitted = String::new();
        for ch in text.chars() {
            fitted.push(ch);
            if self.text_width(font, &fitted, size) > budget {
                fitted.pop();
                break;
            }
        }
        fitted.push_str("..");
        fitted
    }
}

fn parse_face(font: Font) -> Result<Face<'static>> {
    Face::parse(font.data(), 0).with_context(|| format!("parse bundled font {}", font.name()))
}

/// Decoded image flattened onto white, ready to embed as RGB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl PdfImage {
    pub fn load(path: &Path) -> Result<Self> {
        let decoded = image::open(path).with_context(|| {
            format!(
                "decode signature image {} -- pick a PNG or JPEG file",
                path.display()
            )
        })?;
        let (width, height) = decoded.dimensions();
        let decoded = if width > MAX_IMAGE_SIDE || height > MAX_IMAGE_SIDE {
            decoded.thumbnail(MAX_IMAGE_SIDE, MAX_IMAGE_SIDE)
        } else {
            decoded
        };

        let rgba = decoded.to_rgba8();
        let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            let alpha = u16::from(a);
            for channel in [r, g, b] {
                let blended = (u16::from(channel) * alpha + 255 * (255 - alpha)) / 255;
                rgb.push(blended as u8);
            }
        }
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            rgb,
        })
    }

    fn embed(&self) -> Result<Image> {
        use printpdf::image_crate::{DynamicImage, RgbImage};

        let buffer = RgbImage::from_raw(self.width, self.height, self.rgb.clone())
            .ok_or_else(|| anyhow!("signature image buffer does not match its size"))?;
        Ok(Image::from_dynamic_image(&DynamicImage::ImageRgb8(buffer)))
    }
}

/// One positioned drawing operation; `top` is measured down from the page
/// edge.
#[derive(Debug, Clone, PartialEq)]
enum Mark {
    Text {
        x: f32,
        top: f32,
        size: f32,
        font: Font,
        color: Rgb,
        text: String,
    },
    Cell {
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        fill: Rgb,
    },
    Signature {
        left: f32,
        top: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Default)]
struct Page {
    marks: Vec<Mark>,
}

impl Page {
    fn text(&mut self, x: f32, top: f32, size: f32, font: Font, text: &str) {
        self.marks.push(Mark::Text {
            x,
            top,
            size,
            font,
            color: BLACK,
            text: text.to_owned(),
        });
    }

    fn cell(&mut self, left: f32, top: f32, width: f32, height: f32, fill: Rgb) {
        self.marks.push(Mark::Cell {
            left,
            top,
            width,
            height,
            fill,
        });
    }
}

/// Text placed inside a box `width` wide starting at `left`.
struct Slot {
    left: f32,
    width: f32,
    top: f32,
    size: f32,
    font: Font,
    color: Rgb,
    align: Align,
}

struct Layout<'a> {
    metrics: &'a Metrics,
    pages: Vec<Page>,
    top: f32,
}

impl<'a> Layout<'a> {
    fn new(metrics: &'a Metrics) -> Self {
        Self {
            metrics,
            pages: vec![Page::default()],
            top: MARGIN,
        }
    }

    fn page(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn advance(&mut self, height: f32) {
        self.top += height;
    }

    fn fits(&self, height: f32) -> bool {
        self.top + height <= BOTTOM_LIMIT
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.top = MARGIN;
    }

    fn aligned(&self, slot: &Slot, text: &str) -> Mark {
        let fitted = self
            .metrics
            .fit_text(slot.font, text, slot.width - 4.0, slot.size);
        let width = self.metrics.text_width(slot.font, &fitted, slot.size);
        let x = match slot.align {
            Align::Left => slot.left + 2.0,
            Align::Center => slot.left + (slot.width - width) / 2.0,
            Align::Right => slot.left + slot.width - width - 2.0,
        };
        Mark::Text {
            x,
            top: slot.top,
            size: slot.size,
            font: slot.font,
            color: slot.color,
            text: fitted,
        }
    }

    fn aligned_text(&mut self, slot: &Slot, text: &str) {
        let mark = self.aligned(slot, text);
        self.page().marks.push(mark);
    }

    fn table_header(&mut self) {
        let top = self.top;
        for (index, header) in TABLE_HEADERS.iter().enumerate() {
            let left = MARGIN + COLUMN_WIDTH * index as f32;
            self.page()
                .cell(left, top, COLUMN_WIDTH, HEADER_HEIGHT, DARK_BLUE);
            self.aligned_text(
                &Slot {
                    left,
                    width: COLUMN_WIDTH,
                    top: top + 13.5,
                    size: 9.0,
                    font: Font::Bold,
                    color: WHITE,
                    align: Align::Center,
                },
                header,
            );
        }
        self.advance(HEADER_HEIGHT);
    }

    fn table_row(&mut self, cells: &[String; 4], fill: Rgb) {
        if !self.fits(ROW_HEIGHT) {
            self.new_page();
            self.table_header();
        }
        let top = self.top;
        for (index, value) in cells.iter().enumerate() {
            let left = MARGIN + COLUMN_WIDTH * index as f32;
            self.page().cell(left, top, COLUMN_WIDTH, ROW_HEIGHT, fill);
            self.aligned_text(
                &Slot {
                    left,
                    width: COLUMN_WIDTH,
                    top: top + 11.5,
                    size: 8.0,
                    font: Font::Regular,
                    color: BLACK,
                    align: Align::Center,
                },
                value,
            );
        }
        self.advance(ROW_HEIGHT);
    }

    fn number_pages(&mut self) {
        let total = self.pages.len();
        let numbers: Vec<Mark> = (1..=total)
            .map(|number| {
                self.aligned(
                    &Slot {
                        left: MARGIN,
                        width: CONTENT_WIDTH,
                        top: PAGE_HEIGHT - 28.0,
                        size: 8.0,
                        font: Font::Regular,
                        color: BLACK,
                        align: Align::Right,
                    },
                    &format!("{number}/{total}"),
                )
            })
            .collect();
        for (page, mark) in self.pages.iter_mut().zip(numbers) {
            page.marks.push(mark);
        }
    }
}

/// Lays out the activity report and returns the encoded PDF bytes.
pub fn render_mail_report(
    meta: &MailReportMeta,
    year: i32,
    month: Month,
    stats: &WorkhourStats,
) -> Result<Vec<u8>> {
    let signature = match meta.signature_image.as_deref() {
        Some(path) if path.exists() => Some(PdfImage::load(path)?),
        Some(path) => {
            warn!(path = %path.display(), "signature image missing, skipping");
            None
        }
        None => None,
    };

    let metrics = Metrics::bundled()?;
    let pages = lay_out(&metrics, meta, year, month, stats, signature.as_ref())?;
    paint(&pages, signature.as_ref())
}

fn lay_out(
    metrics: &Metrics,
    meta: &MailReportMeta,
    year: i32,
    month: Month,
    stats: &WorkhourStats,
    signature: Option<&PdfImage>,
) -> Result<Vec<Page>> {
    let mut layout = Layout::new(metrics);
    layout.advance(14.0);
    let title_top = layout.top + 20.0;
    layout.aligned_text(
        &Slot {
            left: MARGIN,
            width: CONTENT_WIDTH,
            top: title_top,
            size: 16.0,
            font: Font::Bold,
            color: BLACK,
            align: Align::Center,
        },
        REPORT_TITLE,
    );
    layout.advance(28.0 + 42.0);

    let reference = format!("{} - {month} {year}", meta.invoice_name);
    for (label, value) in [
        ("Firma prestatoare:", meta.from_company.as_str()),
        ("Catre:", meta.to_company.as_str()),
        ("Referitor la factura numarul:", reference.as_str()),
    ] {
        let baseline = layout.top + 11.0;
        let value_left = MARGIN + CONTENT_WIDTH / 3.0;
        let value = metrics.fit_text(
            Font::Regular,
            value,
            CONTENT_WIDTH - CONTENT_WIDTH / 3.0,
            10.0,
        );
        let page = layout.page();
        page.text(MARGIN, baseline, 10.0, Font::Bold, label);
        page.text(value_left, baseline, 10.0, Font::Regular, &value);
        layout.advance(14.0);
    }
    layout.advance(85.0);

    let heading_top = layout.top + 16.0;
    layout.aligned_text(
        &Slot {
            left: MARGIN,
            width: CONTENT_WIDTH,
            top: heading_top,
            size: 11.0,
            font: Font::Bold,
            color: BLACK,
            align: Align::Center,
        },
        "Raport de ore lucrate",
    );
    layout.advance(23.0);

    if !layout.fits(HEADER_HEIGHT + ROW_HEIGHT) {
        layout.new_page();
    }
    layout.table_header();

    let date_format = format_description!("[day]-[month repr:short]-[year]");
    let mut total = 0.0;
    let mut index = 0usize;
    for (date, rows) in &stats.daily_breakdown {
        let label = date
            .format(&date_format)
            .with_context(|| format!("format report date {date}"))?;
        for row in rows {
            let fill = if index % 2 == 1 { LIGHT_BLUE } else { WHITE };
            layout.table_row(
                &[
                    label.clone(),
                    row.project_name.clone(),
                    row.activity_name.clone(),
                    format_amount(row.hours),
                ],
                fill,
            );
            total += row.hours;
            index += 1;
        }
    }
    layout.table_row(
        &[
            String::new(),
            String::new(),
            String::new(),
            format_amount(total),
        ],
        LIGHT_BLUE,
    );

    let signature_height = 28.0
        + if signature.is_some() {
            SIGNATURE_BOX_HEIGHT
        } else {
            0.0
        };
    if !layout.fits(signature_height) {
        layout.new_page();
    }
    let baseline = layout.top + 22.0;
    let half = CONTENT_WIDTH / 2.0;
    for (left, align, label) in [
        (MARGIN, Align::Left, "Semnatura Prestator,"),
        (MARGIN + half, Align::Right, "Semnatura Beneficiar,"),
    ] {
        layout.aligned_text(
            &Slot {
                left,
                width: half,
                top: baseline,
                size: 10.0,
                font: Font::Bold,
                color: BLACK,
                align,
            },
            label,
        );
    }
    layout.advance(28.0);

    if let Some(image) = signature {
        let (width, height) = fit_box(image.width, image.height, half, SIGNATURE_BOX_HEIGHT);
        let top = layout.top;
        layout.page().marks.push(Mark::Signature {
            left: MARGIN,
            top,
            width,
            height,
        });
    }

    layout.number_pages();
    debug!(pages = layout.pages.len(), rows = index, "laid out mail report");
    Ok(layout.pages)
}

fn mm(points: f32) -> Mm {
    Mm(points * MM_PER_PT)
}

fn embed_font(doc: &PdfDocumentReference, font: Font) -> Result<IndirectFontRef> {
    doc.add_external_font(font.data())
        .map_err(|error| anyhow!("embed font {}: {error}", font.name()))
}

fn paint(pages: &[Page], signature: Option<&PdfImage>) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(REPORT_TITLE, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Page 1");
    let regular = embed_font(&doc, Font::Regular)?;
    let bold = embed_font(&doc, Font::Bold)?;

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) = doc.add_page(
                mm(PAGE_WIDTH),
                mm(PAGE_HEIGHT),
                format!("Page {}", index + 1),
            );
            doc.get_page(page_index).get_layer(layer_index)
        };
        for mark in &page.marks {
            match mark {
                Mark::Text {
                    x,
                    top,
                    size,
                    font,
                    color,
                    text,
                } => {
                    let font_ref = match font {
                        Font::Regular => &regular,
                        Font::Bold => &bold,
                    };
                    layer.set_fill_color(color.color());
                    layer.use_text(
                        text.as_str(),
                        *size,
                        mm(*x),
                        mm(PAGE_HEIGHT - top),
                        font_ref,
                    );
                }
                Mark::Cell {
                    left,
                    top,
                    width,
                    height,
                    fill,
                } => paint_cell(&layer, *left, *top, *width, *height, *fill),
                Mark::Signature {
                    left,
                    top,
                    width,
                    height,
                } => {
                    if let Some(image) = signature {
                        paint_signature(&layer, image, *left, *top, *width, *height)?;
                    }
                }
            }
        }
    }

    doc.save_to_bytes()
        .map_err(|error| anyhow!("encode report pdf: {error}"))
}

fn paint_cell(layer: &PdfLayerReference, left: f32, top: f32, width: f32, height: f32, fill: Rgb) {
    let bottom = PAGE_HEIGHT - top - height;
    let corner = |x: f32, y: f32| (Point::new(mm(x), mm(y)), false);
    layer.set_fill_color(fill.color());
    layer.set_outline_color(BLACK.color());
    layer.set_outline_thickness(0.5);
    layer.add_polygon(Polygon {
        rings: vec![vec![
            corner(left, bottom),
            corner(left + width, bottom),
            corner(left + width, bottom + height),
            corner(left, bottom + height),
        ]],
        mode: PaintMode::FillStroke,
        winding_order: WindingOrder::NonZero,
    });
}

fn paint_signature(
    layer: &PdfLayerReference,
    image: &PdfImage,
    left: f32,
    top: f32,
    width: f32,
    height: f32,
) -> Result<()> {
    if image.width == 0 || image.height == 0 {
        return Ok(());
    }
    let natural_width = image.width as f32 * 72.0 / IMAGE_DPI;
    let natural_height = image.height as f32 * 72.0 / IMAGE_DPI;
    image.embed()?.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(mm(left)),
            translate_y: Some(mm(PAGE_HEIGHT - top - height)),
            scale_x: Some(width / natural_width),
            scale_y: Some(height / natural_height),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
    Ok(())
}

fn fit_box(width: u32, height: u32, max_width: f32, max_height: f32) -> (f32, f32) {
    if width == 0 || height == 0 {
        return (0.0, 0.0);
    }
    let scale = (max_width / width as f32).min(max_height / height as f32);
    (width as f32 * scale, height as f32 * scale)
}
