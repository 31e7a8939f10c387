//! HTTP client for the utility's outage calendar endpoint.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::header::{ACCEPT, REFERER, USER_AGENT};
use svitlo_core::clock::{day_bounds_utc, iso_millis};
use svitlo_core::config::CalendarConfig;
use svitlo_core::{IntervalParser, RenderedSchedule, TimeSlotStatus};
use url::Url;

use crate::decode::decode_times;
use crate::error::FetchError;
use crate::source::ScheduleSource;

const DEBUG_KEY_HEADER: &str = "x-debug-key";
const JSON_LD: &str = "application/ld+json";

/// Fetches one address/group's calendar for the current local day.
#[derive(Debug, Clone)]
pub struct CalendarClient {
    api_url: Url,
    group: String,
    address_token: String,
    debug_key: String,
    referer: String,
    user_agent: String,
    tz: Tz,
    client: reqwest::Client,
}

impl CalendarClient {
    /// Build from configuration. Fails when the URL, group or timezone is unusable.
    pub fn from_config(config: &CalendarConfig) -> Result<Self, FetchError> {
        let raw_url = config
            .api_url
            .as_deref()
            .ok_or_else(|| FetchError::Config("API_URL is not set".to_string()))?;
        let api_url = Url::parse(raw_url)
            .map_err(|e| FetchError::Config(format!("invalid API_URL '{raw_url}': {e}")))?;

        if config.group.is_empty() {
            return Err(FetchError::Config("GROUP is not set".to_string()));
        }

        let tz = config
            .tz()
            .map_err(|e| FetchError::Config(e.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()?;

        Ok(Self {
            api_url,
            group: config.group.clone(),
            address_token: config.address_token(),
            debug_key: STANDARD.encode(config.debug_key_source()),
            referer: config.referer.clone(),
            user_agent: config.user_agent.clone(),
            tz,
            client,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Query parameters for the local day containing `now`.
    pub fn query_params(&self, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
        let (after, before) = day_bounds_utc(self.tz, now);
        vec![
            ("before", iso_millis(before)),
            ("after", iso_millis(after)),
            ("group[]", self.group.clone()),
            ("time", self.address_token.clone()),
        ]
    }

    /// Fetch and decode the slot map for the local day containing `now`.
    pub async fn fetch_times_at(&self, now: DateTime<Utc>) -> Result<TimeSlotStatus, FetchError> {
        let params = self.query_params(now);
        tracing::debug!(url = %self.api_url, group = %self.group, "Fetching outage calendar");

        let response = self
            .client
            .get(self.api_url.clone())
            .query(&params)
            .header(ACCEPT, JSON_LD)
            .header(DEBUG_KEY_HEADER, &self.debug_key)
            .header(REFERER, &self.referer)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let snippet: String = body.chars().take(200).collect();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: snippet,
            });
        }

        decode_times(&body, &self.group)
    }

    pub async fn fetch_schedule_at(&self, now: DateTime<Utc>) -> Result<RenderedSchedule, FetchError> {
        let slots = self.fetch_times_at(now).await?;
        let rendered = IntervalParser::render(&slots);
        tracing::debug!(slots = slots.len(), all_clear = rendered.is_all_clear(), "Calendar decoded");
        Ok(rendered)
    }
}

#[async_trait::async_trait]
impl ScheduleSource for CalendarClient {
    async fn fetch_schedule(&self) -> Result<RenderedSchedule, FetchError> {
        self.fetch_schedule_at(Utc::now()).await
    }

    fn source_name(&self) -> &str {
        "calendar-api"
    }
}
