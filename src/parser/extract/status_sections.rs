//! Lift/trail status blocks whose site is named by an enclosing container.

use super::{Accumulator, MAX_ANCESTOR_DEPTH};
use crate::error::StrategyError;
use crate::model::Site;
use crate::parser::document::{Document, Node, Query};
use crate::parser::entries;

pub const NAME: &str = "status_sections";

const STATUS_SELECTOR: &str = r#"[class*="lift-status"], [class*="trail-status"], [class*="lift_status"], [class*="trail_status"], [id*="lift-status"], [id*="trail-status"]"#;

pub fn run(doc: &Document, acc: &mut Accumulator) -> Result<(), StrategyError> {
    for block in doc.find_all(Query::Css(STATUS_SELECTOR))? {
        if let Some(site) = owning_site(doc, block) {
            entries::parse_container(doc, block, site, acc)?;
        }
    }
    Ok(())
}

/// Nearest ancestor, within [`MAX_ANCESTOR_DEPTH`], whose text names
/// exactly one site.
pub fn owning_site(doc: &Document, node: Node<'_>) -> Option<Site> {
    doc.ancestors_of(node, MAX_ANCESTOR_DEPTH)
        .into_iter()
        .find_map(|ancestor| Site::sole_named_in(&doc.text_of(ancestor)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FacilityKind, FacilityRecord, Status};

    fn markup(html: &str) -> Document {
        Document::from_source(Some("text/html"), html).unwrap()
    }

    #[test]
    fn fixture_snow_summit_block() {
        let html = std::fs::read_to_string("tests/fixtures/report_page.html").unwrap();
        let doc = markup(&html);
        let mut acc = Accumulator::default();
        run(&doc, &mut acc).unwrap();

        let lifts: Vec<_> = acc.records(Site::SnowSummit, FacilityKind::Lift).cloned().collect();
        assert_eq!(
            lifts,
            vec![
                FacilityRecord::new("Summit Express", Status::Open),
                FacilityRecord::new("East Mountain Express", Status::Closed),
                FacilityRecord::new("Chair 4", Status::Open),
            ]
        );
        let trails: Vec<_> = acc.records(Site::SnowSummit, FacilityKind::Trail).collect();
        assert_eq!(trails, vec![&FacilityRecord::new("Miracle Mile", Status::Open)]);
    }

    #[test]
    fn site_too_far_up_is_ignored() {
        let doc = markup(
            "<div><h2>Bear Mountain</h2><div><div><div><div><div><div>\
             <div class=\"lift-status\"><ul><li>Express 1 Open</li></ul></div>\
             </div></div></div></div></div></div></div>",
        );
        let mut acc = Accumulator::default();
        run(&doc, &mut acc).unwrap();
        assert!(acc.candidates().is_empty());
    }

    #[test]
    fn nearest_unambiguous_ancestor() {
        let doc = markup(
            "<main><p>Snow Valley</p><section><h2>Bear Mountain</h2>\
             <div class=\"trail-status\"><ul><li>Park Run - Open</li></ul></div>\
             </section></main>",
        );
        let mut acc = Accumulator::default();
        run(&doc, &mut acc).unwrap();
        assert_eq!(acc.records(Site::BearMountain, FacilityKind::Trail).count(), 1);
    }
}
