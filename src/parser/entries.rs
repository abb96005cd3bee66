//! Sub-parsers shared by the markup strategies: asterisk-marker blocks,
//! status tables and status list items.

use std::sync::LazyLock;

use regex::Regex;

use super::document::{collapse_whitespace, Document, Node, Query};
use super::extract::Accumulator;
use super::normalize::{normalize, RawStatus};
use crate::error::StrategyError;
use crate::model::{FacilityKind, FacilityRecord, Site, Status};

/// Tokens a lift name must contain for table rows and marker entries.
pub const LIFT_KEYWORDS: &[&str] = &["Chair", "Express", "MC", "Lift"];

const TABLE_RELEVANCE: &[&str] = &["lift", "chair", "status", "open", "closed"];
const MARKER: char = '*';

static TIME_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let time = r"(?:\d{1,2}:\d{2}\s*(?:[ap]\.?m\.?)?|\d{1,2}\s*[ap]\.?m\.?)";
    Regex::new(&format!(r"(?i){time}\s*[-–—]+\s*{time}")).unwrap()
});

static LIST_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // "Summit Express - Open"
        Regex::new(r"^(.+?)\s+[-–—]\s+(.+)$").unwrap(),
        // "Chair 4 Open"
        Regex::new(r"^(.*[^:\s])\s+(Open|Closed)$").unwrap(),
        // "Outlaw: Closed"
        Regex::new(r"^([^:]+):\s*(Open|Closed)$").unwrap(),
    ]
});

pub fn is_lift_name(name: &str) -> bool {
    LIFT_KEYWORDS.iter().any(|kw| name.contains(kw))
}

// ── Marker entries ──

/// Parse `* <lift>` blocks. Info lines until the next marker decide the
/// status: an exact `Open`/`Closed` (last line first), else a time range
/// means open, else closed.
pub fn parse_marker_lines<S: AsRef<str>>(lines: &[S]) -> Vec<FacilityRecord> {
    let mut records = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix(MARKER) {
            if let Some((name, info)) = current.take() {
                records.push(FacilityRecord::new(name, marker_status(&info)));
            }
            let name = rest.trim();
            if !name.is_empty() && is_lift_name(name) {
                current = Some((name.to_string(), Vec::new()));
            }
            continue;
        }
        if let Some((_, info)) = current.as_mut() {
            info.push(line);
        }
    }
    if let Some((name, info)) = current {
        records.push(FacilityRecord::new(name, marker_status(&info)));
    }
    records
}

fn marker_status(info: &[&str]) -> Status {
    let explicit = info
        .iter()
        .rev()
        .find(|l| **l == "Open" || **l == "Closed");
    match explicit {
        Some(&"Open") => Status::Open,
        Some(_) => Status::Closed,
        None if info.iter().any(|l| TIME_RANGE_RE.is_match(l)) => Status::Open,
        None => Status::Closed,
    }
}

pub fn parse_markers(doc: &Document, container: Node<'_>, site: Site, acc: &mut Accumulator) {
    for record in parse_marker_lines(&doc.lines_of(container)) {
        acc.push(site, FacilityKind::Lift, record);
    }
}

// ── Tables ──

/// Read `name | status` rows from one table. Tables without status
/// vocabulary and rows without a lift keyword are ignored.
pub fn parse_table(
    doc: &Document,
    table: Node<'_>,
    site: Site,
    acc: &mut Accumulator,
) -> Result<(), StrategyError> {
    let text = doc.text_of(table).to_lowercase();
    if !TABLE_RELEVANCE.iter().any(|kw| text.contains(kw)) {
        return Ok(());
    }

    let rows = doc.find_in(table, Query::Css("tr"))?;
    for (i, row) in rows.into_iter().enumerate() {
        if i == 0 && !doc.find_in(row, Query::Css("th"))?.is_empty() {
            continue;
        }
        let cells = doc.find_in(row, Query::Css("td, th"))?;
        if cells.len() < 2 {
            continue;
        }
        let name = collapse_whitespace(&doc.text_of(cells[0]));
        if !is_lift_name(&name) {
            continue;
        }
        let status = normalize(&RawStatus::from_text(&collapse_whitespace(&doc.text_of(cells[1]))));
        acc.push(site, FacilityKind::Lift, FacilityRecord::new(name, status));
    }
    Ok(())
}

pub fn parse_tables(
    doc: &Document,
    container: Node<'_>,
    site: Site,
    acc: &mut Accumulator,
) -> Result<(), StrategyError> {
    for table in doc.find_in(container, Query::Field("table"))? {
        parse_table(doc, table, site, acc)?;
    }
    Ok(())
}

// ── List items ──

/// Match one item's text against the list patterns, first match wins.
pub fn parse_list_item(text: &str) -> Option<FacilityRecord> {
    let text = collapse_whitespace(text);
    LIST_PATTERNS.iter().find_map(|re| {
        let caps = re.captures(&text)?;
        let name = caps[1].trim();
        if name.is_empty() {
            return None;
        }
        let status = normalize(&RawStatus::from_text(&caps[2]));
        Some(FacilityRecord::new(name, status))
    })
}

/// Items naming a lift keyword are lifts, everything else is a trail.
pub fn parse_list(
    doc: &Document,
    container: Node<'_>,
    site: Site,
    acc: &mut Accumulator,
) -> Result<(), StrategyError> {
    for item in doc.find_in(container, Query::Field("li"))? {
        if let Some(record) = parse_list_item(&doc.text_of(item)) {
            let kind = if is_lift_name(&record.name) {
                FacilityKind::Lift
            } else {
                FacilityKind::Trail
            };
            acc.push(site, kind, record);
        }
    }
    Ok(())
}

/// Marker (when the site uses that format), table and list sub-parsers
/// over one container.
pub fn parse_container(
    doc: &Document,
    container: Node<'_>,
    site: Site,
    acc: &mut Accumulator,
) -> Result<(), StrategyError> {
    if site.uses_marker_entries() {
        parse_markers(doc, container, site, acc);
    }
    parse_tables(doc, container, site, acc)?;
    parse_list(doc, container, site, acc)
}
