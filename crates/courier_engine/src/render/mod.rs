//! Paginated PDF rendering of an extracted article.

mod layout;
mod metrics;

use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use courier_core::attachment_filename;
use courier_logging::courier_info;
use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::text::{looks_like_markup, markup_to_text, reflow};
use crate::PipelineError;
use layout::{Align, Layout, Mark, Page};
use metrics::{encode_win_ansi, Face};

/// Column width residual markup is reflowed to before layout.
pub const REFLOW_COLUMNS: usize = 100;

const PRODUCER: &str = "Kindle Courier";

/// Page geometry and typography. The defaults describe an A4 page with 40pt
/// margins.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSettings {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub title_size: f32,
    pub meta_size: f32,
    pub body_size: f32,
    pub body_line_gap: f32,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin: 40.0,
            title_size: 24.0,
            meta_size: 10.0,
            body_size: 12.0,
            body_line_gap: 4.0,
        }
    }
}

/// A finished PDF plus the attachment filename suggested for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub bytes: Bytes,
    pub filename: String,
    pub page_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentRenderer {
    settings: PageSettings,
}

impl DocumentRenderer {
    pub fn new(settings: PageSettings) -> Self {
        Self { settings }
    }

    /// Render a body that may still be HTML. Markup is reduced to visible text
    /// and reflowed; anything else is rendered verbatim.
    pub fn render_markup(
        &self,
        title: &str,
        body: &str,
        source_url: Option<&str>,
    ) -> Result<RenderedDocument, PipelineError> {
        if looks_like_markup(body) {
            self.render(title, &reflow(&markup_to_text(body), REFLOW_COLUMNS), source_url)
        } else {
            self.render(title, body, source_url)
        }
    }

    /// Render a plain-text body with today's date in the metadata block.
    pub fn render(
        &self,
        title: &str,
        body: &str,
        source_url: Option<&str>,
    ) -> Result<RenderedDocument, PipelineError> {
        let now = Utc::now();
        let filename = attachment_filename(source_url.unwrap_or(title), now.timestamp_millis());
        self.render_at(title, body, source_url, now.date_naive(), filename)
    }

    /// Render a plain-text body with an explicit generation date and filename.
    /// Identical inputs produce identical bytes.
    pub fn render_at(
        &self,
        title: &str,
        body: &str,
        source_url: Option<&str>,
        generated_on: NaiveDate,
        filename: String,
    ) -> Result<RenderedDocument, PipelineError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(PipelineError::Render("title is empty".to_string()));
        }

        let pages = self.layout(title, body, source_url, generated_on);
        let bytes = write_pdf(&self.settings, &pages, title)?;
        courier_info!(
            "Rendered \"{}\" into {} page(s), {} bytes",
            title,
            pages.len(),
            bytes.len()
        );

        Ok(RenderedDocument {
            bytes: Bytes::from(bytes),
            filename,
            page_count: pages.len(),
        })
    }

    fn layout(
        &self,
        title: &str,
        body: &str,
        source_url: Option<&str>,
        generated_on: NaiveDate,
    ) -> Vec<Page> {
        let s = &self.settings;
        let mut layout = Layout::new(s);

        layout.paragraph(title, Face::Bold, s.title_size, 4.0, Align::Center);
        layout.move_down(s.title_size * 0.5);

        let source = source_url.filter(|u| !u.trim().is_empty()).unwrap_or("Unknown");
        layout.paragraph(&format!("Source: {source}"), Face::Regular, s.meta_size, 2.0, Align::Left);
        layout.paragraph(
            &format!("Generated: {}", generated_on.format("%Y-%m-%d")),
            Face::Regular,
            s.meta_size,
            2.0,
            Align::Left,
        );
        layout.move_down(s.meta_size);
        layout.rule();
        layout.move_down(s.body_size);

        for line in body.lines() {
            layout.paragraph(line, Face::Regular, s.body_size, s.body_line_gap, Align::Left);
        }

        layout.finish()
    }
}

fn write_pdf(settings: &PageSettings, pages: &[Page], title: &str) -> Result<Vec<u8>, PipelineError> {
    if pages.is_empty() {
        return Err(PipelineError::Render("layout produced no pages".to_string()));
    }

    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let info_id = Ref::new(3);
    let regular_id = Ref::new(4);
    let bold_id = Ref::new(5);
    let mut next_id = 6;
    let mut alloc = move || {
        let id = Ref::new(next_id);
        next_id += 1;
        id
    };
    let page_ids: Vec<(Ref, Ref)> = pages.iter().map(|_| (alloc(), alloc())).collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id)
        .kids(page_ids.iter().map(|(page_id, _)| *page_id))
        .count(page_ids.len() as i32);

    for (page, (page_id, content_id)) in pages.iter().zip(&page_ids) {
        {
            let mut pdf_page = pdf.page(*page_id);
            pdf_page.media_box(Rect::new(0.0, 0.0, settings.width, settings.height));
            pdf_page.parent(page_tree_id);
            pdf_page.contents(*content_id);
            pdf_page
                .resources()
                .fonts()
                .pair(Name(Face::Regular.resource_name()), regular_id)
                .pair(Name(Face::Bold.resource_name()), bold_id);
        }
        pdf.stream(*content_id, &page_content(page));
    }

    for (face, id) in [(Face::Regular, regular_id), (Face::Bold, bold_id)] {
        pdf.type1_font(id)
            .base_font(Name(face.base_font()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    pdf.document_info(info_id)
        .title(TextStr(title))
        .producer(TextStr(PRODUCER));

    Ok(pdf.finish())
}

fn page_content(page: &Page) -> Vec<u8> {
    let mut content = Content::new();
    for mark in &page.marks {
        match mark {
            Mark::Text {
                face,
                size,
                x,
                y,
                text,
            } => {
                let encoded = encode_win_ansi(text);
                content.begin_text();
                content.set_font(Name(face.resource_name()), *size);
                content.next_line(*x, *y);
                content.show(Str(&encoded));
                content.end_text();
            }
            Mark::Rule { x1, x2, y } => {
                content.set_line_width(1.0);
                content.move_to(*x1, *y);
                content.line_to(*x2, *y);
                content.stroke();
            }
        }
    }
    content.finish()
}
