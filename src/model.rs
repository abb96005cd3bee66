use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The three ski areas tracked by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Site {
    SnowValley,
    SnowSummit,
    BearMountain,
}

impl Site {
    pub const ALL: [Site; 3] = [Site::SnowValley, Site::SnowSummit, Site::BearMountain];

    /// Name as it appears on the source pages.
    pub fn display_name(self) -> &'static str {
        match self {
            Site::SnowValley => "Snow Valley",
            Site::SnowSummit => "Snow Summit",
            Site::BearMountain => "Bear Mountain",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Site::SnowValley => "snowValley",
            Site::SnowSummit => "snowSummit",
            Site::BearMountain => "bearMountain",
        }
    }

    /// Resort id used by the upstream JSON feed.
    pub fn feed_id(self) -> &'static str {
        match self {
            Site::SnowValley => "173",
            Site::SnowSummit => "58",
            Site::BearMountain => "57",
        }
    }

    pub fn from_feed_id(id: &str) -> Option<Site> {
        Site::ALL.into_iter().find(|s| s.feed_id() == id)
    }

    /// First site whose display name occurs in `text`.
    pub fn named_in(text: &str) -> Option<Site> {
        Site::ALL
            .into_iter()
            .find(|s| text.contains(s.display_name()))
    }

    /// The site named in `text`, provided no other site is named too.
    pub fn sole_named_in(text: &str) -> Option<Site> {
        let mut named = Site::ALL
            .into_iter()
            .filter(|s| text.contains(s.display_name()));
        match (named.next(), named.next()) {
            (Some(site), None) => Some(site),
            _ => None,
        }
    }

    /// Whether the site's report lists lifts as `* <name>` blocks.
    pub fn uses_marker_entries(self) -> bool {
        matches!(self, Site::SnowValley)
    }

    /// Minimum merged lift count before extracted lifts are trusted.
    pub fn lift_threshold(self) -> usize {
        match self {
            Site::SnowValley => 5,
            Site::SnowSummit | Site::BearMountain => 3,
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Canonical facility status. Unrecognized source labels are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Open,
    Closed,
    Limited,
    ClosedForSeason,
    Unknown,
    Other(String),
}

impl Status {
    /// Case-sensitive mapping of a source label onto the canonical set.
    pub fn from_label(label: &str) -> Status {
        match label {
            "Open" => Status::Open,
            "Closed" => Status::Closed,
            "Limited" => Status::Limited,
            "Closed for Season" | "ClosedForSeason" => Status::ClosedForSeason,
            "Unknown" => Status::Unknown,
            other => Status::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Status::Open => "Open",
            Status::Closed => "Closed",
            Status::Limited => "Limited",
            Status::ClosedForSeason => "Closed for Season",
            Status::Unknown => "Unknown",
            Status::Other(s) => s,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Status::from_label(&label))
    }
}

/// A lift or a trail. `name` is the displayed name and the per-site dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityRecord {
    pub name: String,
    pub status: Status,
}

impl FacilityRecord {
    pub fn new(name: impl Into<String>, status: Status) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacilityKind {
    Lift,
    Trail,
}

/// Lifts and trails of one site, each unique by name in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteReport {
    pub lifts: Vec<FacilityRecord>,
    pub trails: Vec<FacilityRecord>,
}

impl SiteReport {
    /// Insert unless a record of the same kind already has this name.
    /// Returns whether the record was kept.
    pub fn insert(&mut self, kind: FacilityKind, record: FacilityRecord) -> bool {
        let list = match kind {
            FacilityKind::Lift => &mut self.lifts,
            FacilityKind::Trail => &mut self.trails,
        };
        if list.iter().any(|r| r.name == record.name) {
            return false;
        }
        list.push(record);
        true
    }

    pub fn has_unique_names(&self) -> bool {
        fn unique(list: &[FacilityRecord]) -> bool {
            let mut seen = HashSet::new();
            list.iter().all(|r| seen.insert(r.name.as_str()))
        }
        unique(&self.lifts) && unique(&self.trails)
    }
}

pub type Locations = BTreeMap<Site, SiteReport>;

/// Where a returned snapshot came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    Fresh,
    Cache { age_secs: i64 },
    Fallback { error: String },
}

impl Provenance {
    pub fn source(&self) -> &'static str {
        match self {
            Provenance::Fresh => "fresh",
            Provenance::Cache { .. } => "cache",
            Provenance::Fallback { .. } => "fallback",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Provenance::Fresh => String::new(),
            Provenance::Cache { age_secs } => format!("{} seconds", age_secs),
            Provenance::Fallback { error } => error.clone(),
        }
    }
}

impl Serialize for Provenance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("source", self.source())?;
        match self {
            Provenance::Fresh => {}
            Provenance::Cache { .. } => map.serialize_entry("age", &self.detail())?,
            Provenance::Fallback { error } => map.serialize_entry("error", error)?,
        }
        map.end()
    }
}

/// One extraction or cache-reuse result, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResortSnapshot {
    pub timestamp: DateTime<Utc>,
    pub locations: Locations,
    #[serde(rename = "_meta")]
    pub provenance: Provenance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_first_writer() {
        let mut report = SiteReport::default();
        assert!(report.insert(FacilityKind::Lift, FacilityRecord::new("Chair 1", Status::Open)));
        assert!(!report.insert(FacilityKind::Lift, FacilityRecord::new("Chair 1", Status::Closed)));
        assert!(report.insert(FacilityKind::Trail, FacilityRecord::new("Chair 1", Status::Closed)));
        assert_eq!(report.lifts, vec![FacilityRecord::new("Chair 1", Status::Open)]);
        assert!(report.has_unique_names());
    }

    #[test]
    fn status_labels() {
        assert_eq!(Status::from_label("Closed for Season"), Status::ClosedForSeason);
        assert_eq!(Status::from_label("open"), Status::Other("open".into()));
        assert_eq!(Status::ClosedForSeason.label(), "Closed for Season");
        let json = serde_json::to_string(&Status::Other("Hold".into())).unwrap();
        assert_eq!(json, "\"Hold\"");
    }

    #[test]
    fn site_resolution() {
        assert_eq!(Site::sole_named_in("Snow Valley lifts"), Some(Site::SnowValley));
        assert_eq!(Site::sole_named_in("Snow Valley and Bear Mountain"), None);
        assert_eq!(Site::named_in("Bear Mountain Resort"), Some(Site::BearMountain));
        assert_eq!(Site::from_feed_id("58"), Some(Site::SnowSummit));
    }

    #[test]
    fn provenance_meta_shape() {
        let cache = serde_json::to_value(Provenance::Cache { age_secs: 42 }).unwrap();
        assert_eq!(cache, serde_json::json!({ "source": "cache", "age": "42 seconds" }));
        let fresh = serde_json::to_value(Provenance::Fresh).unwrap();
        assert_eq!(fresh, serde_json::json!({ "source": "fresh" }));
        let fallback = serde_json::to_value(Provenance::Fallback { error: "timed out".into() }).unwrap();
        assert_eq!(fallback, serde_json::json!({ "source": "fallback", "error": "timed out" }));
    }

    #[test]
    fn locations_serialize_with_site_keys() {
        let mut locations = Locations::new();
        locations.insert(Site::BearMountain, SiteReport::default());
        let value = serde_json::to_value(&locations).unwrap();
        assert!(value.get("bearMountain").is_some());
    }
}
