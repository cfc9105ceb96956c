//! SWOT section extraction.
//!
//! Model output is free text; the only structure is convention. The
//! extractor scans it line by line for the four header tokens (`Strengths:`,
//! `Weaknesses:`, `Opportunities:`, `Threats:`, ASCII case-insensitive,
//! anywhere in a line) and slices the text between consecutive headers.
//! Prose before the first header is ignored.

use std::fmt;

/// One of the four SWOT categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Strengths,
    Weaknesses,
    Opportunities,
    Threats,
}

impl Section {
    /// Canonical display order.
    pub const ALL: [Section; 4] = [
        Section::Strengths,
        Section::Weaknesses,
        Section::Opportunities,
        Section::Threats,
    ];

    /// Title-case label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Strengths => "Strengths",
            Self::Weaknesses => "Weaknesses",
            Self::Opportunities => "Opportunities",
            Self::Threats => "Threats",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// SectionMap
// ---------------------------------------------------------------------------

/// Detected sections and their bodies, in order of first appearance.
///
/// Consumers that display sections should use [`SectionMap::canonical`],
/// which yields present sections in S-W-O-T order regardless of where they
/// appeared in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    entries: Vec<(Section, String)>,
}

impl SectionMap {
    /// Insert a body. A repeated section keeps its first position and takes
    /// the latest body.
    pub fn insert(&mut self, section: Section, body: impl Into<String>) {
        let body = body.into();
        match self.entries.iter_mut().find(|(s, _)| *s == section) {
            Some(entry) => entry.1 = body,
            None => self.entries.push((section, body)),
        }
    }

    pub fn get(&self, section: Section) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, body)| body.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sections in order of appearance in the source text.
    pub fn iter(&self) -> impl Iterator<Item = (Section, &str)> {
        self.entries.iter().map(|(s, body)| (*s, body.as_str()))
    }

    /// Present sections in canonical S-W-O-T order.
    pub fn canonical(&self) -> impl Iterator<Item = (Section, &str)> {
        Section::ALL
            .into_iter()
            .filter_map(|s| self.get(s).map(|body| (s, body)))
    }

    /// Rebuild report text as `"Label:\n" + body` per section, canonical order.
    pub fn to_text(&self) -> String {
        self.canonical()
            .map(|(s, body)| format!("{}:\n{body}", s.label()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ---------------------------------------------------------------------------
// Header scanner
// ---------------------------------------------------------------------------

/// A header token located in the source text (byte offsets).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeaderToken {
    section: Section,
    /// Offset of the first label byte.
    start: usize,
    /// Offset just past the colon.
    end: usize,
}

/// Find every header token, leftmost first, without overlaps.
fn scan_headers(text: &str) -> Vec<HeaderToken> {
    let mut tokens = Vec::new();
    let mut line_start = 0;
    for line in text.split_inclusive('\n') {
        scan_line(line, line_start, &mut tokens);
        line_start += line.len();
    }
    tokens
}

fn scan_line(line: &str, base: usize, tokens: &mut Vec<HeaderToken>) {
    let bytes = line.as_bytes();
    let mut i = 0;
    'scan: while i < line.len() {
        if bytes[i].is_ascii_alphabetic() {
            for section in Section::ALL {
                let label = section.label();
                let colon = i + label.len();
                let matches_label = line
                    .get(i..colon)
                    .is_some_and(|candidate| candidate.eq_ignore_ascii_case(label));
                if matches_label && bytes.get(colon) == Some(&b':') {
                    tokens.push(HeaderToken {
                        section,
                        start: base + i,
                        end: base + colon + 1,
                    });
                    i = colon + 1;
                    continue 'scan;
                }
            }
        }
        i += 1;
    }
}

/// Strip surrounding whitespace and any run of leading colons.
fn clean_body(raw: &str) -> &str {
    raw.trim_start_matches(|c: char| c == ':' || c.is_whitespace())
        .trim_end()
}

/// Split a raw SWOT report into its sections.
///
/// Returns an empty map when no header is found; callers treat that as
/// "could not detect standard sections".
pub fn extract_sections(text: &str) -> SectionMap {
    let tokens = scan_headers(text);
    let mut map = SectionMap::default();

    for (i, token) in tokens.iter().enumerate() {
        let body_end = tokens.get(i + 1).map_or(text.len(), |next| next.start);
        map.insert(token.section, clean_body(&text[token.end..body_end]));
    }

    tracing::debug!(headers = tokens.len(), sections = map.len(), "extracted sections");
    map
}
