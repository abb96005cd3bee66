use tracing::info;

use super::extract::Accumulator;
use crate::fallback;
use crate::model::{Locations, Site, SiteReport};

/// Fold candidates into one report per site. The first record seen for a
/// name wins; later candidates with the same name are dropped.
pub fn merge(acc: &Accumulator) -> Locations {
    let mut locations: Locations = Site::ALL
        .into_iter()
        .map(|site| (site, SiteReport::default()))
        .collect();

    for candidate in acc.candidates() {
        let report = locations.entry(candidate.site).or_default();
        report.insert(candidate.kind, candidate.record.clone());
    }
    locations
}

/// Replace the lift list of every site below its threshold with the static
/// list. Trails are left as merged.
pub fn apply_gate(mut locations: Locations) -> Locations {
    for site in Site::ALL {
        let report = locations.entry(site).or_default();
        let found = report.lifts.len();
        if found < site.lift_threshold() {
            info!(
                site = %site,
                found,
                threshold = site.lift_threshold(),
                "too few lifts extracted, using fallback lifts"
            );
            report.lifts = fallback::lifts(site);
        }
    }
    locations
}
