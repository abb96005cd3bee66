//! Last resort for sites that still have no lifts: known lift-name
//! templates anywhere in the content, and literal named-lift checks.
//!
//! Both reads are coarse. A template takes the next `Open`/`Closed` token
//! after it, wherever that is, and a named lift is considered open when
//! the word `Open` appears anywhere at all.

use std::sync::LazyLock;

use regex::Regex;

use super::Accumulator;
use crate::error::StrategyError;
use crate::model::{FacilityKind, FacilityRecord, Site, Status};
use crate::parser::document::Document;

pub const NAME: &str = "name_patterns";

static CHAIR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bChair \d+\b").unwrap());
static EXPRESS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bExpress \d+\b").unwrap());
static STATUS_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(Open|Closed)\b").unwrap());
static OPEN_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bOpen\b").unwrap());

fn template(site: Site) -> Option<&'static Regex> {
    match site {
        Site::SnowValley => Some(&*CHAIR_RE),
        Site::SnowSummit => None,
        Site::BearMountain => Some(&*EXPRESS_RE),
    }
}

fn named_lifts(site: Site) -> &'static [&'static str] {
    match site {
        Site::SnowValley => &["MC 16"],
        Site::SnowSummit => &["Summit Express", "East Mountain Express"],
        Site::BearMountain => &[],
    }
}

pub fn run(doc: &Document, acc: &mut Accumulator) -> Result<(), StrategyError> {
    let empty: Vec<Site> = Site::ALL
        .into_iter()
        .filter(|s| acc.lift_count(*s) == 0)
        .collect();
    if empty.is_empty() {
        return Ok(());
    }

    let text = doc.flat_text();
    let any_open = OPEN_WORD_RE.is_match(&text);

    for site in empty {
        if let Some(re) = template(site) {
            for name in re.find_iter(&text) {
                if let Some(token) = STATUS_TOKEN_RE.find_at(&text, name.end()) {
                    let status = if token.as_str() == "Open" {
                        Status::Open
                    } else {
                        Status::Closed
                    };
                    acc.push(site, FacilityKind::Lift, FacilityRecord::new(name.as_str(), status));
                }
            }
        }
        for name in named_lifts(site) {
            if text.contains(name) {
                let status = if any_open { Status::Open } else { Status::Closed };
                acc.push(site, FacilityKind::Lift, FacilityRecord::new(*name, status));
            }
        }
    }
    Ok(())
}
