//! Typed decode of the calendar API's JSON-LD response.
//!
//! Only `hydra:member[0].dataJson[group].times` is read; every step fails
//! closed with [`FetchError::Shape`].

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use svitlo_core::TimeSlotStatus;

use crate::error::FetchError;

#[derive(Debug, Deserialize)]
struct CalendarResponse {
    #[serde(rename = "hydra:member", default)]
    members: Vec<CalendarMember>,
}

#[derive(Debug, Deserialize)]
struct CalendarMember {
    #[serde(rename = "dataJson", default)]
    data_json: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct GroupDay {
    times: Option<BTreeMap<String, StatusCode>>,
}

/// The API sends codes as strings, older payloads as numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StatusCode {
    Text(String),
    Number(serde_json::Number),
}

impl StatusCode {
    fn into_code(self) -> String {
        match self {
            StatusCode::Text(s) => s,
            StatusCode::Number(n) => n.to_string(),
        }
    }
}

/// Extract one group's slot map from a raw response body.
pub fn decode_times(body: &str, group: &str) -> Result<TimeSlotStatus, FetchError> {
    let response: CalendarResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Shape(format!("invalid calendar document: {e}")))?;

    let member = response
        .members
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Shape("hydra:member is empty".to_string()))?;

    let mut data = member
        .data_json
        .ok_or_else(|| FetchError::Shape("member has no dataJson".to_string()))?;

    let raw_group = data
        .remove(group)
        .ok_or_else(|| FetchError::Shape(format!("no data for group '{group}'")))?;

    let day: GroupDay = serde_json::from_value(raw_group)
        .map_err(|e| FetchError::Shape(format!("group '{group}': {e}")))?;

    let times = day
        .times
        .ok_or_else(|| FetchError::Shape(format!("group '{group}' has no times")))?;

    let slots = TimeSlotStatus::from_codes(
        times.into_iter().map(|(label, code)| (label, code.into_code())),
    )?;
    Ok(slots)
}
