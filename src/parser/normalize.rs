use serde_json::Value;

use crate::model::Status;

/// Status as the source happens to represent it. Resolved once by
/// [`normalize`]; nothing downstream inspects the raw shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawStatus {
    Text(String),
    Flag(bool),
    State(String),
    Absent,
}

impl RawStatus {
    /// Read `status`, then `isOpen`, then `state` from a feed item.
    pub fn from_feed_item(item: &Value) -> RawStatus {
        if let Some(text) = item.get("status").and_then(Value::as_str) {
            if !text.is_empty() {
                return RawStatus::Text(text.to_string());
            }
        }
        if let Some(flag) = item.get("isOpen").and_then(Value::as_bool) {
            return RawStatus::Flag(flag);
        }
        match item.get("state").and_then(Value::as_str) {
            Some(state) if !state.is_empty() => RawStatus::State(state.to_string()),
            _ => RawStatus::Absent,
        }
    }

    pub fn from_text(text: &str) -> RawStatus {
        let text = text.trim();
        if text.is_empty() {
            RawStatus::Absent
        } else {
            RawStatus::Text(text.to_string())
        }
    }
}

pub fn normalize(raw: &RawStatus) -> Status {
    match raw {
        RawStatus::Text(text) if !text.is_empty() => Status::from_label(text),
        RawStatus::Flag(true) => Status::Open,
        RawStatus::Flag(false) => Status::Closed,
        RawStatus::State(state) if !state.is_empty() => Status::from_label(state),
        _ => Status::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flags_and_absence() {
        assert_eq!(normalize(&RawStatus::Flag(true)), Status::Open);
        assert_eq!(normalize(&RawStatus::Flag(false)), Status::Closed);
        assert_eq!(normalize(&RawStatus::Absent), Status::Unknown);
    }

    #[test]
    fn explicit_strings_pass_through() {
        assert_eq!(normalize(&RawStatus::Text("Limited".into())), Status::Limited);
        assert_eq!(
            normalize(&RawStatus::Text("Wind Hold".into())),
            Status::Other("Wind Hold".into())
        );
    }

    #[test]
    fn feed_field_precedence() {
        let item = json!({ "name": "Chair 1", "status": "Closed", "isOpen": true });
        assert_eq!(RawStatus::from_feed_item(&item), RawStatus::Text("Closed".into()));

        let item = json!({ "name": "Chair 1", "status": "", "isOpen": true });
        assert_eq!(RawStatus::from_feed_item(&item), RawStatus::Flag(true));

        let item = json!({ "name": "Chair 1", "state": "Scheduled" });
        let raw = RawStatus::from_feed_item(&item);
        assert_eq!(raw, RawStatus::State("Scheduled".into()));
        assert_eq!(normalize(&raw), Status::Other("Scheduled".into()));

        let item = json!({ "name": "Chair 1" });
        assert_eq!(normalize(&RawStatus::from_feed_item(&item)), Status::Unknown);
    }

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(RawStatus::from_text("  "), RawStatus::Absent);
        assert_eq!(RawStatus::from_text(" Open "), RawStatus::Text("Open".into()));
    }
}
