//! Page-wide fallbacks: a marker regex over the whole text for sites the
//! report blocks missed, and a scan of every table on the page.

use std::sync::LazyLock;

use regex::Regex;

use super::{report_sections, status_sections, Accumulator};
use crate::error::StrategyError;
use crate::model::{FacilityKind, FacilityRecord, Site, Status};
use crate::parser::document::{Document, Query};
use crate::parser::entries;

pub const NAME: &str = "page_patterns";

const TABLE_KEYWORDS: &[&str] = &["chair", "express", "lift"];

// `* Chair 9 ... Open`, spanning lines but not the next marker.
static PAGE_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\s*((?:Chair|Express|MC|Lift)\s+[^\s*]+)[^*]*?\b(Open|Closed)\b").unwrap()
});

pub fn run(doc: &Document, acc: &mut Accumulator) -> Result<(), StrategyError> {
    scan_markers(doc, acc);
    scan_tables(doc, acc)
}

fn scan_markers(doc: &Document, acc: &mut Accumulator) {
    let pending: Vec<Site> = Site::ALL
        .into_iter()
        .filter(|s| s.uses_marker_entries() && !acc.found_by(*s, report_sections::NAME))
        .collect();
    if pending.is_empty() {
        return;
    }

    let text = doc.flat_text();
    for site in pending {
        for caps in PAGE_MARKER_RE.captures_iter(&text) {
            let status = if &caps[2] == "Open" {
                Status::Open
            } else {
                Status::Closed
            };
            acc.push(site, FacilityKind::Lift, FacilityRecord::new(&caps[1], status));
        }
    }
}

/// Tables naming one site, or mentioning lifts inside a block that does.
fn scan_tables(doc: &Document, acc: &mut Accumulator) -> Result<(), StrategyError> {
    for table in doc.find_all(Query::Field("table"))? {
        let text = doc.text_of(table);
        let site = Site::sole_named_in(&text).or_else(|| {
            let lower = text.to_lowercase();
            TABLE_KEYWORDS
                .iter()
                .any(|kw| lower.contains(kw))
                .then(|| status_sections::owning_site(doc, table))
                .flatten()
        });
        if let Some(site) = site {
            entries::parse_table(doc, table, site, acc)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markup(html: &str) -> Document {
        Document::from_source(Some("text/html"), html).unwrap()
    }

    #[test]
    fn marker_scan_when_report_blocks_missed() {
        let doc = markup(
            "<body><div>* Chair 1</div><div>Open</div>\
             <div>* Chair 2 — Closed today</div>\
             <div>* Rentals</div><div>Open</div></body>",
        );
        let mut acc = Accumulator::default();
        run(&doc, &mut acc).unwrap();
        let lifts: Vec<_> = acc.records(Site::SnowValley, FacilityKind::Lift).cloned().collect();
        assert_eq!(
            lifts,
            vec![
                FacilityRecord::new("Chair 1", Status::Open),
                FacilityRecord::new("Chair 2", Status::Closed),
            ]
        );
    }

    #[test]
    fn marker_scan_skipped_after_report_hit() {
        let doc = markup("<div>* Chair 1</div><div>Open</div>");
        let mut acc = Accumulator::default();
        acc.current = report_sections::NAME;
        acc.push(Site::SnowValley, FacilityKind::Lift, FacilityRecord::new("Chair 5", Status::Open));
        acc.current = NAME;
        run(&doc, &mut acc).unwrap();
        assert_eq!(acc.lift_count(Site::SnowValley), 1);
    }

    #[test]
    fn loose_tables_by_site_or_keyword() {
        let doc = markup(
            "<table><caption>Bear Mountain lifts</caption>\
             <tr><td>Express 9</td><td>Open</td></tr></table>\
             <section><h2>Snow Summit</h2><table>\
             <tr><th>Lift</th><th>Status</th></tr>\
             <tr><td>Chair 6</td><td>Closed</td></tr></table></section>\
             <table><tr><td>Chair 99</td><td>Open</td></tr></table>",
        );
        let mut acc = Accumulator::default();
        run(&doc, &mut acc).unwrap();
        assert_eq!(
            acc.records(Site::BearMountain, FacilityKind::Lift).collect::<Vec<_>>(),
            vec![&FacilityRecord::new("Express 9", Status::Open)]
        );
        assert_eq!(
            acc.records(Site::SnowSummit, FacilityKind::Lift).collect::<Vec<_>>(),
            vec![&FacilityRecord::new("Chair 6", Status::Closed)]
        );
        // orphan table: no site anywhere above it
        assert_eq!(acc.candidates().len(), 2);
    }
}
