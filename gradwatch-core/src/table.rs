//! Listing table extraction.
//!
//! The README renders listings as raw HTML `<table>` blocks inside markdown.
//! Tables nested in a `<details>` element hold archived listings and are
//! ignored. Cells are mapped to posting fields by position through a
//! [`ColumnLayout`], never by header text.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};
use serde::Deserialize;

use crate::age::normalize_age;
use crate::posting::Posting;

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("table selector parses"));
static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("link selector parses"));

/// Stands in for `<br>` inside a cell.
pub const LINE_SEPARATOR: &str = " | ";
/// Sub-row marker the README puts in front of repeated company names.
const INDENT_GLYPH: char = '↳';

/// Zero-based cell positions of each posting field within a table row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub company: usize,
    pub title: usize,
    pub location: usize,
    pub link: usize,
    pub age: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            company: 0,
            title: 1,
            location: 2,
            link: 3,
            age: 4,
        }
    }
}

impl ColumnLayout {
    /// Rows with fewer cells than this are skipped.
    pub fn min_cells(&self) -> usize {
        [self.company, self.title, self.location, self.link, self.age]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// Extract one [`Posting`] per qualifying row of every active table in `fragment`.
///
/// Rows lacking a link are kept (with `url: None`) so callers can count them.
pub fn extract_postings(fragment: &str, layout: &ColumnLayout) -> Vec<Posting> {
    let html = Html::parse_fragment(fragment);
    let mut postings = Vec::new();
    let mut skipped = 0usize;

    for table in active_tables(&html) {
        for row in body_rows(table) {
            let cells: Vec<ElementRef<'_>> = child_elements(row, "td").collect();
            if cells.len() < layout.min_cells() {
                skipped += 1;
                continue;
            }
            postings.push(posting_from_cells(&cells, layout));
        }
    }

    tracing::debug!(
        rows = postings.len(),
        skipped,
        "[TABLE] Extracted postings from active tables"
    );
    postings
}

/// Every `<table>` that has no `<details>` ancestor, in document order.
pub fn active_tables(html: &Html) -> Vec<ElementRef<'_>> {
    html.select(&TABLE).filter(|t| !inside_details(*t)).collect()
}

fn inside_details(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .any(|n| n.value().as_element().is_some_and(|e| e.name() == "details"))
}

fn body_rows(table: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    child_elements(table, "tbody").flat_map(|tbody| child_elements(tbody, "tr"))
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == name)
}

fn posting_from_cells(cells: &[ElementRef<'_>], layout: &ColumnLayout) -> Posting {
    let company = cell_text(cells[layout.company]).replace(INDENT_GLYPH, "");
    let location = display_location(&cell_text(cells[layout.location]));
    let age_raw = cell_text(cells[layout.age]);
    let age_days = normalize_age(&age_raw);

    Posting {
        company: company.trim().to_string(),
        title: cell_text(cells[layout.title]),
        url: first_href(cells[layout.link]),
        location,
        age_raw,
        age_days,
    }
}

/// Visible text of a cell with `<br>` rendered as [`LINE_SEPARATOR`] and
/// whitespace collapsed.
fn cell_text(cell: ElementRef<'_>) -> String {
    let mut pieces: Vec<&str> = Vec::new();
    for node in cell.descendants() {
        match node.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    pieces.push(text);
                }
            }
            Node::Element(el) if el.name() == "br" => pieces.push(LINE_SEPARATOR.trim()),
            _ => {}
        }
    }
    normalize_whitespace(&pieces.join(" "))
}

/// Join the line pieces of a location cell with ", ", dropping empty ones.
fn display_location(text: &str) -> String {
    text.split(LINE_SEPARATOR.trim())
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_href(cell: ElementRef<'_>) -> Option<String> {
    cell.select(&LINK)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(str::to_string)
}
