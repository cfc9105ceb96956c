//! Terminal rendering of SWOT reports.

use analyst_report::{SectionMap, clean_line, report_title};

/// Render present sections in canonical order, one `- line` per non-blank
/// body line.
pub(crate) fn render_sections(sections: &SectionMap, query: &str) -> String {
    let mut out = format!("  {}\n", report_title(query));

    for (section, body) in sections.canonical() {
        out.push('\n');
        out.push_str(&format!("  {}:\n", section.label()));
        for line in body.lines().map(clean_line).filter(|l| !l.is_empty()) {
            out.push_str(&format!("    - {line}\n"));
        }
    }
    out
}
