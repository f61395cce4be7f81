//! Markup inspection helpers and assertion macros for tabula harnesses.
//!
//! The helpers slice rendered table markup into header labels, row ids and
//! body cells so assertions can talk about the table instead of raw strings.

// ---------------------------------------------------------------------------
// Markup slicing
// ---------------------------------------------------------------------------

/// `data-id` of every body row, in order.
pub fn row_ids(markup: &str) -> Vec<String> {
    markup
        .split("<tr data-entity=")
        .skip(1)
        .filter_map(|chunk| attribute(chunk, "data-id"))
        .collect()
}

/// Inner HTML of every header cell, in order.
pub fn header_cells(markup: &str) -> Vec<String> {
    let Some(start) = markup.find("<thead>") else {
        return Vec::new();
    };
    let Some(end) = markup[start..].find("</thead>") else {
        return Vec::new();
    };
    cells(&markup[start..start + end], "<th", "</th>")
}

/// Inner HTML of every body cell, one `Vec` per row.
pub fn body_cells(markup: &str) -> Vec<Vec<String>> {
    markup
        .split("<tr data-entity=")
        .skip(1)
        .map(|chunk| {
            let row = chunk.split("</tr>").next().unwrap_or_default();
            cells(row, "<td", "</td>")
        })
        .collect()
}

fn cells(fragment: &str, open: &str, close: &str) -> Vec<String> {
    fragment
        .split(open)
        .skip(1)
        .filter_map(|cell| {
            let body_start = cell.find('>')? + 1;
            let body_end = cell.rfind(close)?;
            Some(cell[body_start..body_end].to_string())
        })
        .collect()
}

fn attribute(fragment: &str, name: &str) -> Option<String> {
    let needle = format!("{name}=\"");
    let start = fragment.find(&needle)? + needle.len();
    let len = fragment[start..].find('"')?;
    Some(fragment[start..start + len].to_string())
}

// ---------------------------------------------------------------------------
// Assertions
// ---------------------------------------------------------------------------

/// Assert the body rows carry exactly these ids, in this order.
///
/// ```rust
/// assert_rows!(report, ["w1", "w3"]);
/// ```
#[macro_export]
macro_rules! assert_rows {
    ($report:expr, [$($id:expr),* $(,)?]) => {{
        let report: &tabula_core::RenderedReport = &$report;
        let actual = $crate::common::assertions::row_ids(&report.table_markup);
        let expected: Vec<String> = vec![$($id.to_string()),*];
        if actual != expected {
            panic!(
                "assert_rows! failed:\n  expected: {:?}\n  actual:   {:?}\n  markup: {}",
                expected, actual, report.table_markup
            );
        }
    }};
}

/// Assert the report has exactly one header row.
#[macro_export]
macro_rules! assert_single_header {
    ($report:expr) => {{
        let report: &tabula_core::RenderedReport = &$report;
        let headers = report.table_markup.matches("<thead>").count();
        let header_rows = report
            .table_markup
            .split("<thead>")
            .nth(1)
            .map(|h| h.split("</thead>").next().unwrap_or_default().matches("<tr").count())
            .unwrap_or(0);
        if headers != 1 || header_rows != 1 {
            panic!(
                "assert_single_header! failed: {} thead, {} header rows\n  markup: {}",
                headers, header_rows, report.table_markup
            );
        }
    }};
}

/// Assert the auxiliary markup announces `count` records with this summary text.
///
/// ```rust
/// assert_summary!(report, 2, "2 results");
/// ```
#[macro_export]
macro_rules! assert_summary {
    ($report:expr, $count:expr, $text:expr) => {{
        let report: &tabula_core::RenderedReport = &$report;
        let count: usize = $count;
        let text: &str = $text;
        let banner = format!("data-count=\"{}\">{}</div>", count, text);
        let payload = format!("\"count\":{}", count);
        if !report.auxiliary_markup.contains(&banner) || !report.auxiliary_markup.contains(&payload) {
            panic!(
                "assert_summary! failed:\n  expected banner: {}\n  auxiliary: {}",
                banner, report.auxiliary_markup
            );
        }
    }};
}
