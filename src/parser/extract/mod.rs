pub mod feed;
pub mod name_patterns;
pub mod page_patterns;
pub mod report_sections;
pub mod status_sections;

use tracing::{debug, warn};

use super::document::Document;
use crate::error::StrategyError;
use crate::model::{FacilityKind, FacilityRecord, Site};

/// How far a strategy may walk up from a node to find its owning site.
pub const MAX_ANCESTOR_DEPTH: usize = 5;

pub type StrategyFn = fn(&Document, &mut Accumulator) -> Result<(), StrategyError>;

/// Strategies in priority order. Earlier candidates win the merge.
pub const CASCADE: &[(&str, StrategyFn)] = &[
    (feed::NAME, feed::run as StrategyFn),
    (report_sections::NAME, report_sections::run as StrategyFn),
    (status_sections::NAME, status_sections::run as StrategyFn),
    (page_patterns::NAME, page_patterns::run as StrategyFn),
    (name_patterns::NAME, name_patterns::run as StrategyFn),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub site: Site,
    pub kind: FacilityKind,
    pub record: FacilityRecord,
    pub strategy: &'static str,
}

/// Candidate records from every strategy, in discovery order. Duplicates
/// are allowed here and resolved by the merge.
#[derive(Debug, Default)]
pub struct Accumulator {
    candidates: Vec<Candidate>,
    current: &'static str,
}

impl Accumulator {
    pub fn push(&mut self, site: Site, kind: FacilityKind, record: FacilityRecord) {
        self.candidates.push(Candidate {
            site,
            kind,
            record,
            strategy: self.current,
        });
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn records(&self, site: Site, kind: FacilityKind) -> impl Iterator<Item = &FacilityRecord> {
        self.candidates
            .iter()
            .filter(move |c| c.site == site && c.kind == kind)
            .map(|c| &c.record)
    }

    pub fn lift_count(&self, site: Site) -> usize {
        self.records(site, FacilityKind::Lift).count()
    }

    /// Whether `strategy` produced anything for `site`.
    pub fn found_by(&self, site: Site, strategy: &str) -> bool {
        self.candidates
            .iter()
            .any(|c| c.site == site && c.strategy == strategy)
    }
}

/// Run every strategy in order over one document. A failing strategy is
/// logged and its partial output discarded; the rest still run.
pub fn run_cascade(doc: &Document, strategies: &[(&'static str, StrategyFn)]) -> Accumulator {
    let mut acc = Accumulator::default();
    for &(name, run) in strategies {
        acc.current = name;
        let checkpoint = acc.candidates.len();
        match run(doc, &mut acc) {
            Ok(()) => debug!(
                strategy = name,
                added = acc.candidates.len() - checkpoint,
                "strategy finished"
            ),
            Err(err) => {
                warn!(strategy = name, error = %err, "strategy failed, skipping");
                acc.candidates.truncate(checkpoint);
            }
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;

    fn broken(_: &Document, acc: &mut Accumulator) -> Result<(), StrategyError> {
        acc.push(Site::SnowValley, FacilityKind::Lift, FacilityRecord::new("Chair 99", Status::Open));
        Err(StrategyError::Shape("boom".into()))
    }

    fn steady(_: &Document, acc: &mut Accumulator) -> Result<(), StrategyError> {
        acc.push(Site::SnowValley, FacilityKind::Lift, FacilityRecord::new("Chair 1", Status::Closed));
        Ok(())
    }

    #[test]
    fn failing_strategy_is_isolated() {
        let doc = Document::from_source(Some("text/html"), "<p></p>").unwrap();
        let acc = run_cascade(&doc, &[("broken", broken as StrategyFn), ("steady", steady as StrategyFn)]);
        assert_eq!(acc.candidates().len(), 1);
        assert_eq!(acc.candidates()[0].record.name, "Chair 1");
        assert!(acc.found_by(Site::SnowValley, "steady"));
        assert!(!acc.found_by(Site::SnowValley, "broken"));
    }

    #[test]
    fn empty_markup_yields_nothing() {
        let doc = Document::from_source(Some("text/html"), "<html><body></body></html>").unwrap();
        let acc = run_cascade(&doc, CASCADE);
        assert!(acc.candidates().is_empty());
    }
}
