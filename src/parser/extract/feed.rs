//! JSON feed: `{ resorts: [{ id, name, lifts: [...], trails: [...] }] }`.

use serde_json::Value;
use tracing::{debug, info};

use super::Accumulator;
use crate::error::StrategyError;
use crate::model::{FacilityKind, FacilityRecord, Site};
use crate::parser::document::{Document, Node, Query};
use crate::parser::normalize::{normalize, RawStatus};

pub const NAME: &str = "feed";

pub fn run(doc: &Document, acc: &mut Accumulator) -> Result<(), StrategyError> {
    if doc.is_markup() {
        return Ok(());
    }

    for node in doc.find_all(Query::Field("resorts"))? {
        let Some(resorts) = node.as_value() else {
            continue;
        };
        let resorts = resorts
            .as_array()
            .ok_or_else(|| StrategyError::Shape("`resorts` is not an array".into()))?;
        info!("Found {} resorts in feed", resorts.len());

        for resort in resorts {
            let Some(site) = resort_site(doc, resort) else {
                debug!(name = ?resort.get("name"), "skipping unrecognized resort");
                continue;
            };
            push_items(resort.get("lifts"), site, FacilityKind::Lift, acc);
            push_items(resort.get("trails"), site, FacilityKind::Trail, acc);
        }
    }
    Ok(())
}

/// Map by feed id first, then by name.
fn resort_site(doc: &Document, resort: &Value) -> Option<Site> {
    let node = Node::Value(resort);
    doc.attr(node, "id")
        .and_then(|id| Site::from_feed_id(&id))
        .or_else(|| doc.attr(node, "name").and_then(|name| Site::named_in(&name)))
}

fn push_items(items: Option<&Value>, site: Site, kind: FacilityKind, acc: &mut Accumulator) {
    let Some(items) = items.and_then(Value::as_array) else {
        return;
    };
    for item in items {
        let Some(name) = item.get("name").and_then(Value::as_str).filter(|n| !n.is_empty()) else {
            continue;
        };
        let status = normalize(&RawStatus::from_feed_item(item));
        acc.push(site, kind, FacilityRecord::new(name, status));
    }
}
