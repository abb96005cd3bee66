//! Last-known-good static dataset, used when extraction cannot be trusted.

use crate::model::{FacilityRecord, Locations, Site, SiteReport, Status};

fn records(entries: &[(&str, Status)]) -> Vec<FacilityRecord> {
    entries
        .iter()
        .map(|(name, status)| FacilityRecord::new(*name, status.clone()))
        .collect()
}

pub fn lifts(site: Site) -> Vec<FacilityRecord> {
    match site {
        Site::SnowValley => records(&[
            ("Chair 1", Status::Closed),
            ("MC 16", Status::Closed),
            ("Chair 2", Status::Closed),
            ("Chair 3", Status::Closed),
            ("Chair 6", Status::Closed),
            ("Chair 8", Status::Closed),
            ("Chair 9", Status::Closed),
            ("Chair 11", Status::Closed),
            ("Chair 12", Status::Closed),
            ("Chair 13", Status::Closed),
        ]),
        Site::SnowSummit => records(&[
            ("Summit Express", Status::Open),
            ("East Mountain Express", Status::Open),
            ("Chair 4", Status::Open),
            ("Chair 6", Status::Open),
            ("Chair 8", Status::Closed),
        ]),
        Site::BearMountain => records(&[
            ("Express 1", Status::Open),
            ("Express 2", Status::Open),
            ("Express 9", Status::Open),
            ("Chair 7", Status::Closed),
        ]),
    }
}

pub fn trails(site: Site) -> Vec<FacilityRecord> {
    match site {
        Site::SnowValley => records(&[
            ("Westridge", Status::Closed),
            ("Snow Valley Run", Status::Closed),
            ("Slide Peak", Status::ClosedForSeason),
            ("Rim Trail", Status::Closed),
        ]),
        Site::SnowSummit => records(&[
            ("Miracle Mile", Status::Open),
            ("Summit Run", Status::Open),
            ("Log Chute", Status::Limited),
            ("Westridge", Status::Open),
            ("Wall Street", Status::Closed),
        ]),
        Site::BearMountain => records(&[
            ("Central Park", Status::Open),
            ("Park Run", Status::Open),
            ("Goldmine Mountain", Status::Closed),
            ("Outlaw", Status::Open),
            ("Exhibition", Status::Limited),
        ]),
    }
}

/// Every site's static lifts and trails.
pub fn locations() -> Locations {
    Site::ALL
        .into_iter()
        .map(|site| {
            (
                site,
                SiteReport {
                    lifts: lifts(site),
                    trails: trails(site),
                },
            )
        })
        .collect()
}
