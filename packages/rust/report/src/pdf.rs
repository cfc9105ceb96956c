//! PDF rendering of a paginated [`Layout`] with printpdf.

use analyst_shared::{AnalystError, Result};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};

use crate::layout::{Layout, TextStyle};

/// Download filename for rendered reports.
pub const REPORT_FILENAME: &str = "SWOT_Report.pdf";

/// Media type of rendered reports.
pub const REPORT_MIME: &str = "application/pdf";

/// Something that turns a layout into bytes.
pub trait LayoutSink {
    fn render(&self, layout: &Layout) -> Result<Vec<u8>>;
}

/// Draws each element with the standard Helvetica faces.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    title: String,
}

impl PdfRenderer {
    /// `title` becomes the document metadata title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// Points to millimetres.
fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

fn render_err(e: impl std::fmt::Display) -> AnalystError {
    AnalystError::Render(e.to_string())
}

impl LayoutSink for PdfRenderer {
    fn render(&self, layout: &Layout) -> Result<Vec<u8>> {
        let g = &layout.geometry;
        let (width, height) = (mm(g.width), mm(g.height));

        let (doc, first_page, first_layer) =
            PdfDocument::new(self.title.as_str(), width, height, "Page 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_err)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_err)?;

        for (i, page) in layout.pages.iter().enumerate() {
            let (page_idx, layer_idx) = if i == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(width, height, format!("Page {}", page.number))
            };
            let layer = doc.get_page(page_idx).get_layer(layer_idx);

            for element in &page.elements {
                let (font, size, text): (&IndirectFontRef, f32, String) = match element.style {
                    TextStyle::Title => (&bold, g.title_font_size, element.text.clone()),
                    TextStyle::SectionHeader => (&bold, g.header_font_size, element.text.clone()),
                    TextStyle::Bullet => {
                        (&regular, g.body_font_size, format!("- {}", element.text))
                    }
                };
                layer.use_text(text, size, mm(element.x), mm(element.y), font);
            }
        }

        let bytes = doc.save_to_bytes().map_err(render_err)?;
        tracing::debug!(pages = layout.page_count(), bytes = bytes.len(), "rendered pdf");
        Ok(bytes)
    }
}
