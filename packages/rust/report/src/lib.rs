//! SWOT report handling: section extraction, pagination, PDF output.

pub mod layout;
pub mod pdf;
pub mod sections;

pub use layout::{
    Layout, Page, PageGeometry, TextElement, TextStyle, clean_line, paginate, report_title,
};
pub use pdf::{LayoutSink, PdfRenderer, REPORT_FILENAME, REPORT_MIME};
pub use sections::{Section, SectionMap, extract_sections};

use analyst_shared::Result;

/// Message shown when the model returned nothing.
pub const EMPTY_REPORT_MESSAGE: &str = "Empty SWOT analysis received.";

/// Message shown when no standard section header was found.
pub const UNSTRUCTURED_REPORT_MESSAGE: &str = "Could not detect standard SWOT sections.";

/// What a consumer can do with a raw report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportStatus {
    /// Nothing but whitespace.
    Empty,
    /// Text present, but no section header detected.
    Unstructured,
    /// At least one section detected.
    Structured(SectionMap),
}

impl ReportStatus {
    /// User-facing explanation for the non-structured cases.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Empty => Some(EMPTY_REPORT_MESSAGE),
            Self::Unstructured => Some(UNSTRUCTURED_REPORT_MESSAGE),
            Self::Structured(_) => None,
        }
    }
}

/// Classify a raw report.
pub fn assess(report: &str) -> ReportStatus {
    if report.trim().is_empty() {
        return ReportStatus::Empty;
    }
    let sections = extract_sections(report);
    if sections.is_empty() {
        ReportStatus::Unstructured
    } else {
        ReportStatus::Structured(sections)
    }
}

/// A rendered, downloadable report.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub filename: &'static str,
    pub mime: &'static str,
    pub pages: usize,
    pub bytes: Vec<u8>,
}

/// Paginate `sections` on A4 and render them to PDF, titled after `query`.
pub fn render_pdf(sections: &SectionMap, query: &str) -> Result<RenderedReport> {
    let layout = paginate(sections, Some(query), &PageGeometry::A4);
    let bytes = PdfRenderer::new(report_title(query)).render(&layout)?;
    Ok(RenderedReport {
        filename: REPORT_FILENAME,
        mime: REPORT_MIME,
        pages: layout.page_count(),
        bytes,
    })
}
