pub mod document;
pub mod entries;
pub mod extract;
pub mod merge;
pub mod normalize;

use tracing::info;

use crate::error::PipelineError;
use crate::model::Locations;
use document::Document;

/// Full extraction: detect content kind → run the strategy cascade → merge
/// → completeness gate. Only content that cannot be read at all fails.
pub fn extract_locations(content_type: Option<&str>, body: &str) -> Result<Locations, PipelineError> {
    let doc = Document::from_source(content_type, body)?;
    let acc = extract::run_cascade(&doc, extract::CASCADE);
    info!(candidates = acc.candidates().len(), "extraction cascade finished");
    Ok(merge::apply_gate(merge::merge(&acc)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;
    use crate::model::{FacilityRecord, Site, Status};

    #[test]
    fn feed_fixture() {
        let json = std::fs::read_to_string("tests/fixtures/feed.json").unwrap();
        let locations = extract_locations(Some("application/json"), &json).unwrap();

        assert_eq!(locations[&Site::SnowValley].lifts.len(), 6);
        assert_eq!(locations[&Site::SnowSummit].lifts.len(), 4);
        // one distinct lift for Bear Mountain is below threshold
        assert_eq!(locations[&Site::BearMountain].lifts, fallback::lifts(Site::BearMountain));
        assert!(locations.values().all(|r| r.has_unique_names()));
    }

    #[test]
    fn report_page_fixture() {
        let html = std::fs::read_to_string("tests/fixtures/report_page.html").unwrap();
        let locations = extract_locations(Some("text/html"), &html).unwrap();

        let valley = &locations[&Site::SnowValley];
        assert_eq!(valley.lifts.len(), 5);
        assert_eq!(valley.lifts[0], FacilityRecord::new("Chair 1", Status::Open));

        let summit = &locations[&Site::SnowSummit];
        assert_eq!(summit.lifts.len(), 3);
        assert_eq!(summit.trails, vec![FacilityRecord::new("Miracle Mile", Status::Open)]);

        let bear = &locations[&Site::BearMountain];
        assert_eq!(
            bear.lifts,
            vec![
                FacilityRecord::new("Express 1", Status::Open),
                FacilityRecord::new("Express 2", Status::Limited),
                FacilityRecord::new("Chair 7", Status::Closed),
            ]
        );
        assert_eq!(bear.trails.len(), 2);
    }

    #[test]
    fn page_with_nothing_falls_back_per_site() {
        let locations = extract_locations(Some("text/html"), "<html><body><p>Closed today</p></body></html>").unwrap();
        for site in Site::ALL {
            assert_eq!(locations[&site].lifts, fallback::lifts(site));
            assert!(locations[&site].trails.is_empty());
        }
    }

    #[test]
    fn unreadable_content_aborts() {
        let err = extract_locations(Some("image/png"), "\u{89}PNG").unwrap_err();
        assert_eq!(err.stage(), "parse");
        assert!(extract_locations(Some("application/json"), "{not json").is_err());
    }
}
