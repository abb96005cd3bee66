//! Read-only traversal over source content, whether it arrived as markup or
//! as a JSON feed. Strategies only see content through this layer.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::error::{PipelineError, StrategyError};

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "section", "table", "tbody", "td", "th", "thead", "tr", "ul",
];

pub enum Document {
    Markup(Html),
    Feed(Value),
}

/// Handle to one node of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Element(ElementRef<'a>),
    Value(&'a Value),
}

impl<'a> Node<'a> {
    pub fn as_value(self) -> Option<&'a Value> {
        match self {
            Node::Value(v) => Some(v),
            Node::Element(_) => None,
        }
    }
}

/// Selection by CSS (markup only) or by element/field name (either kind).
#[derive(Debug, Clone, Copy)]
pub enum Query<'q> {
    Css(&'q str),
    Field(&'q str),
}

impl Document {
    /// Pick the content kind from the declared content type, sniffing the
    /// body when the type is missing or generic.
    pub fn from_source(content_type: Option<&str>, body: &str) -> Result<Document, PipelineError> {
        let declared = content_type.unwrap_or("").to_ascii_lowercase();
        if body.trim().is_empty() {
            let label = if declared.is_empty() { "unknown".into() } else { declared };
            return Err(PipelineError::UnexpectedContent(label));
        }
        if declared.contains("json") {
            return Ok(Document::Feed(serde_json::from_str(body)?));
        }
        if declared.contains("html") || declared.contains("xml") {
            return Ok(Document::Markup(Html::parse_document(body)));
        }

        let head = body.trim_start();
        if head.starts_with('{') || head.starts_with('[') {
            Ok(Document::Feed(serde_json::from_str(body)?))
        } else if head.starts_with('<') {
            Ok(Document::Markup(Html::parse_document(body)))
        } else if declared.is_empty() {
            Err(PipelineError::UnexpectedContent("unknown".into()))
        } else {
            Err(PipelineError::UnexpectedContent(declared))
        }
    }

    pub fn is_markup(&self) -> bool {
        matches!(self, Document::Markup(_))
    }

    pub fn root(&self) -> Node<'_> {
        match self {
            Document::Markup(html) => Node::Element(html.root_element()),
            Document::Feed(value) => Node::Value(value),
        }
    }

    /// All matches in document order. Each call reruns the query.
    pub fn find_all(&self, query: Query<'_>) -> Result<Vec<Node<'_>>, StrategyError> {
        self.find_in(self.root(), query)
    }

    /// Matches among the descendants of `scope`.
    pub fn find_in<'a>(&'a self, scope: Node<'a>, query: Query<'_>) -> Result<Vec<Node<'a>>, StrategyError> {
        match (scope, query) {
            (Node::Element(el), Query::Css(css) | Query::Field(css)) => {
                let selector = parse_selector(css)?;
                Ok(el.select(&selector).map(Node::Element).collect())
            }
            (Node::Value(value), Query::Field(key)) => {
                let mut out = Vec::new();
                collect_fields(value, key, &mut out);
                Ok(out.into_iter().map(Node::Value).collect())
            }
            (Node::Value(_), Query::Css(_)) => Ok(Vec::new()),
        }
    }

    /// Flattened text of a node and its descendants.
    pub fn text_of(&self, node: Node<'_>) -> String {
        match node {
            Node::Element(el) => el.text().collect::<String>(),
            Node::Value(value) => {
                let mut parts = Vec::new();
                collect_scalars(value, &mut parts);
                parts.join(" ")
            }
        }
    }

    /// Visual lines of a node: block elements and `<br>` break lines, blank
    /// lines are dropped and inner whitespace collapsed.
    pub fn lines_of(&self, node: Node<'_>) -> Vec<String> {
        let raw = match node {
            Node::Element(el) => {
                let mut out = String::new();
                push_block_text(el, &mut out);
                out
            }
            Node::Value(value) => {
                let mut parts = Vec::new();
                collect_scalars(value, &mut parts);
                parts.join("\n")
            }
        };
        raw.lines()
            .map(collapse_whitespace)
            .filter(|l| !l.is_empty())
            .collect()
    }

    /// Whole content as lines joined by newlines.
    pub fn flat_text(&self) -> String {
        self.lines_of(self.root()).join("\n")
    }

    pub fn attr(&self, node: Node<'_>, key: &str) -> Option<String> {
        match node {
            Node::Element(el) => el.value().attr(key).map(str::to_string),
            Node::Value(value) => match value.get(key)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            },
        }
    }

    /// Up to `depth` enclosing nodes, nearest first.
    pub fn ancestors_of<'a>(&'a self, node: Node<'a>, depth: usize) -> Vec<Node<'a>> {
        match (self, node) {
            (_, Node::Element(el)) => el
                .ancestors()
                .filter_map(ElementRef::wrap)
                .take(depth)
                .map(Node::Element)
                .collect(),
            (Document::Feed(root), Node::Value(target)) => {
                let mut path = Vec::new();
                if !path_to(root, target, &mut path) {
                    return Vec::new();
                }
                path.into_iter().rev().take(depth).map(Node::Value).collect()
            }
            (Document::Markup(_), Node::Value(_)) => Vec::new(),
        }
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_selector(css: &str) -> Result<Selector, StrategyError> {
    Selector::parse(css).map_err(|err| StrategyError::Selector {
        selector: css.to_string(),
        reason: err.to_string(),
    })
}

fn push_block_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            scraper::Node::Text(text) => out.push_str(text),
            scraper::Node::Element(inner) => {
                let block = BLOCK_TAGS.contains(&inner.name());
                if block {
                    out.push('\n');
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    push_block_text(child_el, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn collect_fields<'a>(value: &'a Value, key: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    out.push(v);
                }
                collect_fields(v, key, out);
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_fields(v, key, out)),
        _ => {}
    }
}

fn collect_scalars(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Number(n) => out.push(n.to_string()),
        Value::Bool(b) => out.push(b.to_string()),
        Value::Null => {}
        Value::Array(items) => items.iter().for_each(|v| collect_scalars(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_scalars(v, out)),
    }
}

fn path_to<'a>(current: &'a Value, target: &Value, path: &mut Vec<&'a Value>) -> bool {
    if std::ptr::eq(current, target) {
        return true;
    }
    path.push(current);
    let found = match current {
        Value::Object(map) => map.values().any(|v| path_to(v, target, path)),
        Value::Array(items) => items.iter().any(|v| path_to(v, target, path)),
        _ => false,
    };
    if !found {
        path.pop();
    }
    found
}
