//! Remote leaderboard table access.
//!
//! The hosted table is reached through a PostgREST-style HTTP API:
//! `GET  {url}/rest/v1/{table}?select=...&order=score.desc,created_at.desc&limit=N`
//! `POST {url}/rest/v1/{table}` with `Prefer: return=representation`.

use super::entry::LeaderboardEntry;
use crate::config::RemoteConfig;
use crate::core::constants::REMOTE_REQUEST_TIMEOUT_MS;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Failure talking to the remote table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Server answered with a non-2xx status.
    Http(u16, String),
    /// DNS, TLS, connect or timeout failure.
    Transport(String),
    /// Response body did not match the table schema.
    Decode(String),
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Http(code, body) if body.is_empty() => write!(f, "HTTP {}", code),
            RemoteError::Http(code, body) => write!(f, "HTTP {}: {}", code, body),
            RemoteError::Transport(msg) => write!(f, "network error: {}", msg),
            RemoteError::Decode(msg) => write!(f, "bad response: {}", msg),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<ureq::Error> for RemoteError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                let body = response.into_string().unwrap_or_default();
                RemoteError::Http(code, body.chars().take(120).collect())
            }
            ureq::Error::Transport(t) => RemoteError::Transport(t.to_string()),
        }
    }
}

/// Seam between the sync engine and the hosted table.
///
/// Calls block; the sync engine runs them on worker threads.
pub trait RemoteLeaderboard: Send + Sync {
    /// Top `limit` rows ordered by score desc, created_at desc.
    fn fetch_top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, RemoteError>;

    /// Insert a row; returns the stored row with its id and timestamp.
    fn insert(&self, entry: &LeaderboardEntry) -> Result<LeaderboardEntry, RemoteError>;

    /// Websocket endpoint for change notifications, if the backend has one.
    fn change_feed(&self) -> Option<ChangeFeedTarget> {
        None
    }
}

/// Where and how to subscribe to table changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFeedTarget {
    pub url: String,
    pub table: String,
}

/// Row as stored remotely. Ids may be numeric or uuid depending on schema.
#[derive(Debug, Deserialize)]
struct RemoteRow {
    id: serde_json::Value,
    name: String,
    score: i64,
    level: i64,
    created_at: DateTime<Utc>,
}

impl RemoteRow {
    fn into_entry(self) -> LeaderboardEntry {
        let id = match self.id {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        };
        LeaderboardEntry {
            id,
            name: self.name,
            score: self.score.clamp(0, u32::MAX as i64) as u32,
            level: self.level.clamp(1, u32::MAX as i64) as u32,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    name: &'a str,
    score: u32,
    level: u32,
}

/// HTTP client for the hosted table.
#[derive(Debug, Clone)]
pub struct RestLeaderboard {
    base_url: String,
    api_key: String,
    table: String,
    agent: ureq::Agent,
}

impl RestLeaderboard {
    pub fn new(config: &RemoteConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(REMOTE_REQUEST_TIMEOUT_MS))
            .build();
        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            table: config.table.clone(),
            agent,
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authorized(&self, request: ureq::Request) -> ureq::Request {
        request
            .set("apikey", &self.api_key)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("User-Agent", "gridsnake")
    }
}

/// Parse a JSON array of table rows, skipping rows that don't fit.
fn parse_rows(body: serde_json::Value) -> Result<Vec<LeaderboardEntry>, RemoteError> {
    let rows = match body {
        serde_json::Value::Array(rows) => rows,
        other => {
            return Err(RemoteError::Decode(format!(
                "expected array, got {}",
                json_kind(&other)
            )))
        }
    };
    Ok(rows
        .into_iter()
        .filter_map(|row| serde_json::from_value::<RemoteRow>(row).ok())
        .map(RemoteRow::into_entry)
        .collect())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Turn an http(s) base URL into the realtime websocket endpoint.
pub fn realtime_url(base_url: &str, api_key: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let ws = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}/realtime/v1/websocket?apikey={}&vsn=1.0.0", ws, api_key)
}

impl RemoteLeaderboard for RestLeaderboard {
    fn fetch_top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, RemoteError> {
        let body: serde_json::Value = self
            .authorized(self.agent.get(&self.table_url()))
            .query("select", "id,name,score,level,created_at")
            .query("order", "score.desc,created_at.desc")
            .query("limit", &limit.to_string())
            .call()?
            .into_json()
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        parse_rows(body)
    }

    fn insert(&self, entry: &LeaderboardEntry) -> Result<LeaderboardEntry, RemoteError> {
        let row = InsertRow {
            name: &entry.name,
            score: entry.score,
            level: entry.level,
        };
        let body: serde_json::Value = self
            .authorized(self.agent.post(&self.table_url()))
            .set("Prefer", "return=representation")
            .send_json([row])?
            .into_json()
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        parse_rows(body)?
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::Decode("insert returned no rows".to_string()))
    }

    fn change_feed(&self) -> Option<ChangeFeedTarget> {
        Some(ChangeFeedTarget {
            url: realtime_url(&self.base_url, &self.api_key),
            table: self.table.clone(),
        })
    }
}
