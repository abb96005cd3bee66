//! Report blocks that name exactly one site.

use super::Accumulator;
use crate::error::StrategyError;
use crate::model::Site;
use crate::parser::document::{Document, Node, Query};
use crate::parser::entries;

pub const NAME: &str = "report_sections";

const REPORT_SELECTOR: &str = r#"[class*="report"], [id*="report"]"#;

pub fn run(doc: &Document, acc: &mut Accumulator) -> Result<(), StrategyError> {
    for container in doc.find_all(Query::Css(REPORT_SELECTOR))? {
        if let Some(site) = container_site(doc, container)? {
            entries::parse_container(doc, container, site, acc)?;
        }
    }
    Ok(())
}

/// The block's text must name exactly one site. Wrappers around other
/// report blocks are left to the inner blocks.
fn container_site(doc: &Document, container: Node<'_>) -> Result<Option<Site>, StrategyError> {
    if !doc.find_in(container, Query::Css(REPORT_SELECTOR))?.is_empty() {
        return Ok(None);
    }
    Ok(Site::sole_named_in(&doc.text_of(container)))
}
