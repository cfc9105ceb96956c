//! Page layout for section reports.
//!
//! The paginator turns a [`SectionMap`] into positioned text elements on
//! one or more pages. It knows nothing about PDF; a [`crate::LayoutSink`]
//! draws the result. Coordinates are PDF points with the origin at the
//! bottom-left corner, so the cursor moves downward by decreasing `y`.

use crate::sections::{Section, SectionMap};

/// Page size and spacing, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    /// Distance from the top edge to the first line.
    pub top_margin: f32,
    /// The cursor never draws below this `y`.
    pub bottom_margin: f32,
    /// `x` of titles and section headers.
    pub left_margin: f32,
    /// `x` of body lines.
    pub body_indent: f32,
    pub title_spacing: f32,
    pub header_spacing: f32,
    pub line_spacing: f32,
    /// Extra gap after the last line of a section.
    pub section_spacing: f32,
    pub title_font_size: f32,
    pub header_font_size: f32,
    pub body_font_size: f32,
}

impl PageGeometry {
    /// ISO A4 portrait.
    pub const A4: Self = Self {
        width: 595.28,
        height: 841.89,
        top_margin: 50.0,
        bottom_margin: 50.0,
        left_margin: 50.0,
        body_indent: 60.0,
        title_spacing: 30.0,
        header_spacing: 20.0,
        line_spacing: 15.0,
        section_spacing: 20.0,
        title_font_size: 16.0,
        header_font_size: 14.0,
        body_font_size: 12.0,
    };

    /// `y` of the first line on a fresh page.
    pub fn top(&self) -> f32 {
        self.height - self.top_margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// How a text element is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    /// Report title, bold.
    Title,
    /// `"Label:"`, bold.
    SectionHeader,
    /// One body line, drawn with a leading `"- "` bullet.
    Bullet,
}

/// A positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextElement {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub style: TextStyle,
}

/// One page of positioned elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    pub elements: Vec<TextElement>,
}

/// The full paginated report.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

impl Layout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every element across all pages, in drawing order.
    pub fn elements(&self) -> impl Iterator<Item = &TextElement> {
        self.pages.iter().flat_map(|p| p.elements.iter())
    }
}

/// Strip surrounding whitespace and any leading `•` / `-` bullet markers.
pub fn clean_line(line: &str) -> &str {
    line.trim().trim_start_matches(['•', '-']).trim()
}

/// Format the title line for a query.
pub fn report_title(query: &str) -> String {
    format!("SWOT Report: {query}")
}

// ---------------------------------------------------------------------------
// Paginator
// ---------------------------------------------------------------------------

/// Mutable cursor state; lives only for one [`paginate`] call.
struct Paginator<'g> {
    geometry: &'g PageGeometry,
    pages: Vec<Page>,
    y: f32,
}

impl<'g> Paginator<'g> {
    fn new(geometry: &'g PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Page {
                number: 1,
                elements: Vec::new(),
            }],
            y: geometry.top(),
        }
    }

    /// Place one line at the cursor, starting a new page first if the
    /// cursor has crossed the bottom margin, then advance by `advance`.
    fn place(&mut self, text: String, x: f32, style: TextStyle, advance: f32) {
        if self.y < self.geometry.bottom_margin {
            self.pages.push(Page {
                number: self.pages.len() + 1,
                elements: Vec::new(),
            });
            self.y = self.geometry.top();
        }
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(TextElement {
                text,
                x,
                y: self.y,
                style,
            });
        }
        self.y -= advance;
    }

    fn gap(&mut self, amount: f32) {
        self.y -= amount;
    }

    fn finish(self) -> Layout {
        Layout {
            geometry: *self.geometry,
            pages: self.pages,
        }
    }
}

/// Lay out `sections` in canonical order, one header per present section
/// followed by one bullet per non-blank body line.
///
/// With a `title`, a `"SWOT Report: {title}"` line is placed first.
pub fn paginate(sections: &SectionMap, title: Option<&str>, geometry: &PageGeometry) -> Layout {
    let mut cursor = Paginator::new(geometry);

    if let Some(query) = title {
        cursor.place(
            report_title(query),
            geometry.left_margin,
            TextStyle::Title,
            geometry.title_spacing,
        );
    }

    for section in Section::ALL {
        let Some(body) = sections.get(section) else {
            continue;
        };
        cursor.place(
            format!("{}:", section.label()),
            geometry.left_margin,
            TextStyle::SectionHeader,
            geometry.header_spacing,
        );
        for line in body.lines().map(clean_line).filter(|l| !l.is_empty()) {
            cursor.place(
                line.to_string(),
                geometry.body_indent,
                TextStyle::Bullet,
                geometry.line_spacing,
            );
        }
        cursor.gap(geometry.section_spacing);
    }

    let layout = cursor.finish();
    tracing::debug!(pages = layout.page_count(), "paginated report");
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::extract_sections;

    fn bullets(layout: &Layout) -> Vec<&str> {
        layout
            .elements()
            .filter(|e| e.style == TextStyle::Bullet)
            .map(|e| e.text.as_str())
            .collect()
    }

    #[test]
    fn two_section_scenario() {
        let map = extract_sections("Strengths:\n- Fast\nWeaknesses:\n- Costly\n");
        let layout = paginate(&map, None, &PageGeometry::A4);

        assert_eq!(layout.page_count(), 1);
        let texts: Vec<_> = layout.elements().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["Strengths:", "Fast", "Weaknesses:", "Costly"]);
        assert_eq!(bullets(&layout), ["Fast", "Costly"]);
    }

    #[test]
    fn cursor_positions_follow_spacing() {
        let map = extract_sections("Strengths:\n- Fast\n- Cheap\nThreats:\n- Rivals");
        let g = PageGeometry::A4;
        let layout = paginate(&map, Some("EV market"), &g);
        let ys: Vec<f32> = layout.elements().map(|e| e.y).collect();

        let top = g.top();
        let expected = [
            top,
            top - 30.0,
            top - 50.0,
            top - 65.0,
            // section gap of 20 after the last bullet
            top - 100.0,
            top - 120.0,
        ];
        assert_eq!(ys.len(), expected.len());
        for (got, want) in ys.iter().zip(expected) {
            assert!((got - want).abs() < 1e-3, "{got} != {want}");
        }
        assert_eq!(layout.pages[0].elements[0].text, "SWOT Report: EV market");
        assert_eq!(layout.pages[0].elements[0].style, TextStyle::Title);
    }

    #[test]
    fn sections_render_in_canonical_order() {
        let map = extract_sections("Threats:\n- T\nStrengths:\n- S");
        let layout = paginate(&map, None, &PageGeometry::A4);
        let headers: Vec<_> = layout
            .elements()
            .filter(|e| e.style == TextStyle::SectionHeader)
            .map(|e| e.text.as_str())
            .collect();
        assert_eq!(headers, ["Strengths:", "Threats:"]);
    }

    #[test]
    fn blank_lines_and_bullet_markers_dropped() {
        let map = extract_sections("Opportunities:\n• Exports\n\n   \n-- Storage\n*Asia*");
        let layout = paginate(&map, None, &PageGeometry::A4);
        assert_eq!(bullets(&layout), ["Exports", "Storage", "*Asia*"]);
    }

    #[test]
    fn long_report_spans_pages_within_margins() {
        let body: String = (0..120).map(|i| format!("- point {i}\n")).collect();
        let map = extract_sections(&format!("Strengths:\n{body}Weaknesses:\n{body}"));
        let g = PageGeometry::A4;
        let layout = paginate(&map, Some("long"), &g);

        assert!(layout.page_count() > 1);
        assert_eq!(bullets(&layout).len(), 240);
        for page in &layout.pages {
            assert!(!page.elements.is_empty());
            for element in &page.elements {
                assert!(element.y >= g.bottom_margin, "{} below margin", element.y);
                assert!(element.y <= g.top());
            }
        }
        let numbers: Vec<_> = layout.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, (1..=layout.page_count()).collect::<Vec<_>>());
    }

    #[test]
    fn new_page_restarts_at_top() {
        let body: String = (0..80).map(|i| format!("- {i}\n")).collect();
        let map = extract_sections(&format!("Strengths:\n{body}"));
        let g = PageGeometry::A4;
        let layout = paginate(&map, None, &g);
        assert!(layout.page_count() >= 2);
        assert!((layout.pages[1].elements[0].y - g.top()).abs() < 1e-3);
    }

    #[test]
    fn empty_map_gives_one_empty_page() {
        let layout = paginate(&SectionMap::default(), None, &PageGeometry::A4);
        assert_eq!(layout.page_count(), 1);
        assert!(layout.pages[0].elements.is_empty());
    }

    #[test]
    fn clean_line_strips_markers() {
        assert_eq!(clean_line("  - item "), "item");
        assert_eq!(clean_line("•• item"), "item");
        assert_eq!(clean_line("- -x"), "-x");
        assert_eq!(clean_line("   "), "");
    }
}
