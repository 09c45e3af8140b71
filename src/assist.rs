//! Client for the AI proxy that turns free text into structured data.
//!
//! The proxy forwards a Gemini `generateContent` request and answers with the
//! raw Gemini response; the structured payload is the JSON text inside the
//! first candidate. Any failure yields `None` and is only logged.

use std::time::Duration;

use anyhow::{anyhow, Context};
use chrono::{DateTime, SecondsFormat, Utc};
use log::error;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::Result,
    models::{Task, TaskPriority},
};

pub const PROXY_URL_ENV: &str = "LIFESYNC_GEMINI_PROXY_URL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssistSettings {
    pub proxy_url: String,
    pub timeout_secs: u64,
}

impl Default for AssistSettings {
    fn default() -> Self {
        Self {
            proxy_url: "http://localhost:8787".into(),
            timeout_secs: 30,
        }
    }
}

impl AssistSettings {
    /// The environment variable wins over the settings file.
    pub fn resolved_proxy_url(&self) -> String {
        std::env::var(PROXY_URL_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| self.proxy_url.clone())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTask {
    pub title: String,
    pub due_date: DateTime<Utc>,
    pub priority: TaskPriority,
}

impl ParsedTask {
    pub fn into_task(self, now: DateTime<Utc>) -> Result<Task> {
        Task::new(&self.title, None, self.due_date, self.priority, now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CityTimeZone {
    pub name: String,
    pub time_zone: String,
}

pub struct AssistClient {
    client: Client,
    proxy_url: String,
}

impl AssistClient {
    pub fn new(settings: &AssistSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(5)))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            proxy_url: settings.resolved_proxy_url(),
        })
    }

    pub async fn parse_task(&self, input: &str, now: DateTime<Utc>) -> Option<ParsedTask> {
        let schema = json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "dueDate": { "type": "string", "description": "ISO 8601 date string" },
                "priority": { "type": "string", "enum": ["low", "medium", "high"] }
            },
            "required": ["title", "dueDate", "priority"]
        });

        match self.generate(&task_prompt(input, now), schema).await {
            Ok(parsed) => parsed,
            Err(err) => {
                error!("task parse failed: {err:#}");
                None
            }
        }
    }

    pub async fn resolve_city(&self, query: &str) -> Option<CityTimeZone> {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "timeZone": { "type": "string" }
            },
            "required": ["name", "timeZone"]
        });

        match self.generate(&city_prompt(query), schema).await {
            Ok(resolved) => resolved,
            Err(err) => {
                error!("time zone lookup failed: {err:#}");
                None
            }
        }
    }

    async fn generate<T: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: Value,
    ) -> anyhow::Result<Option<T>> {
        let response = self
            .client
            .post(&self.proxy_url)
            .json(&request_body(prompt, schema))
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.proxy_url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("proxy returned {status}: {}", text.trim()));
        }

        let body: Value = response.json().await.context("proxy response is not JSON")?;
        match extract_candidate(&body)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .context("candidate JSON does not match the schema"),
            None => Ok(None),
        }
    }
}

pub fn request_body(prompt: &str, schema: Value) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": schema
        }
    })
}

/// Pulls the JSON document out of `candidates[0].content.parts[0].text`.
/// A missing candidate or a literal `null` document both mean "no result".
pub fn extract_candidate(body: &Value) -> anyhow::Result<Option<Value>> {
    let Some(text) = body
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
    else {
        return Ok(None);
    };

    let value: Value =
        serde_json::from_str(text.trim()).context("candidate text is not valid JSON")?;
    Ok((!value.is_null()).then_some(value))
}

fn task_prompt(input: &str, now: DateTime<Utc>) -> String {
    format!(
        "Parse the following task request into a structured JSON object.\n\
         The current date and time is {}.\n\
         Calculate the exact ISO dueDate based on the user's relative time (e.g., \"in 20 minutes\", \"tomorrow morning\").\n\
         If no time is specified, default to 1 hour from now.\n\
         User Input: \"{}\"",
        now.to_rfc3339_opts(SecondsFormat::Millis, true),
        input.trim()
    )
}

fn city_prompt(query: &str) -> String {
    format!(
        "Identify the correct IANA time zone identifier and a standard display name (City, Country Code) for the location described as: \"{}\".\n\
         Return a JSON object with keys \"name\" and \"timeZone\".\n\
         Example: {{ \"name\": \"Paris, FR\", \"timeZone\": \"Europe/Paris\" }}\n\
         If the location is invalid or cannot be determined, return null.",
        query.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn gemini_reply(text: &str) -> Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body("hello", json!({ "type": "object" }));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "object");
    }

    #[test]
    fn test_extract_candidate_parses_inner_json() {
        let reply = gemini_reply(
            r#"{"title":"Buy milk","dueDate":"2026-05-02T10:00:00.000Z","priority":"low"}"#,
        );
        let value = extract_candidate(&reply).unwrap().unwrap();
        let parsed: ParsedTask = serde_json::from_value(value).unwrap();

        assert_eq!(parsed.title, "Buy milk");
        assert_eq!(parsed.priority, TaskPriority::Low);
        assert_eq!(
            parsed.due_date,
            Utc.with_ymd_and_hms(2026, 5, 2, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_extract_candidate_without_candidates_is_none() {
        assert_eq!(extract_candidate(&json!({})).unwrap(), None);
        assert_eq!(extract_candidate(&json!({ "candidates": [] })).unwrap(), None);
    }

    #[test]
    fn test_extract_candidate_null_document_is_none() {
        assert_eq!(extract_candidate(&gemini_reply("null")).unwrap(), None);
    }

    #[test]
    fn test_extract_candidate_rejects_garbage() {
        assert!(extract_candidate(&gemini_reply("not json at all")).is_err());
    }

    #[test]
    fn test_parsed_task_with_offset_converts_to_utc() {
        let parsed: ParsedTask = serde_json::from_value(json!({
            "title": "Standup",
            "dueDate": "2026-05-02T10:00:00+02:00",
            "priority": "high"
        }))
        .unwrap();
        assert_eq!(
            parsed.due_date,
            Utc.with_ymd_and_hms(2026, 5, 2, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parsed_task_with_blank_title_is_rejected() {
        let now = Utc.with_ymd_and_hms(2026, 5, 2, 8, 0, 0).unwrap();
        let parsed = ParsedTask {
            title: "  ".into(),
            due_date: now,
            priority: TaskPriority::Medium,
        };
        assert!(parsed.into_task(now).is_err());
    }

    #[test]
    fn test_task_prompt_mentions_input_and_clock() {
        let now = Utc.with_ymd_and_hms(2026, 5, 2, 8, 0, 0).unwrap();
        let prompt = task_prompt("  call mom in 20 minutes ", now);
        assert!(prompt.contains("\"call mom in 20 minutes\""));
        assert!(prompt.contains("2026-05-02T08:00:00.000Z"));
        assert!(prompt.contains("default to 1 hour from now"));
    }

    #[test]
    fn test_city_prompt_mentions_query() {
        let prompt = city_prompt("the city of light");
        assert!(prompt.contains("\"the city of light\""));
        assert!(prompt.contains("timeZone"));
    }
}
