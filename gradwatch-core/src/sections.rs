/// Line prefix that opens a top-level section in the source README.
const SECTION_BREAK: &str = "\n## ";

/// Cut the sections introduced by `markers` out of `document`.
///
/// Each section runs from its marker up to (not including) the next `## `
/// header line, or to the end of the document. Sections are joined with a
/// blank line in marker order. Markers that do not occur are skipped, so the
/// result is empty when none match.
pub fn slice_sections<S: AsRef<str>>(document: &str, markers: &[S]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(markers.len());
    for marker in markers {
        let marker = marker.as_ref();
        if marker.is_empty() {
            continue;
        }
        let Some(start) = document.find(marker) else {
            tracing::debug!(marker, "[SECTIONS] Marker not found, skipping");
            continue;
        };
        // Search past the marker's own "## " so it is not its own terminator.
        let search_from = start + marker.len();
        let end = document[search_from..]
            .find(SECTION_BREAK)
            .map_or(document.len(), |rel| search_from + rel);
        out.push(&document[start..end]);
    }
    out.join("\n\n")
}
