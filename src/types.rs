//! Shared types used across the codebase
//!
//! Rows are built with these types on the way in; rows coming back from the
//! store are passed through as JSON.
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The two mutually exclusive account roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Poster,
    Builder,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "poster" => Some(Role::Poster),
            "builder" => Some(Role::Builder),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Poster => "poster",
            Role::Builder => "builder",
        }
    }
}

/// Timestamps are written the way browsers print `toISOString()`.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now() -> String {
    timestamp(Utc::now())
}

#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub id: String,
    pub email: Option<String>,
    pub username: String,
    pub role: Role,
    pub bio: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewProblem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub tags: Value,
    pub posted_by: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSolution {
    pub id: Uuid,
    pub problem_id: String,
    pub builder_id: String,
    pub description: String,
    pub solution_url: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewDiscussion {
    pub id: Uuid,
    pub problem_id: String,
    pub user_id: String,
    pub parent_id: Option<String>,
    pub message: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewContact {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub subject: String,
    pub message: String,
    pub created_at: String,
}

/// Tags arrive as a list or a comma-separated string.
/// Lists pass through untouched; strings are split and trimmed with empty
/// pieces dropped; anything else is an empty list.
pub fn normalize_tags(raw: Option<&Value>) -> Value {
    match raw {
        Some(Value::Array(items)) => Value::Array(items.clone()),
        Some(Value::String(s)) => Value::Array(
            s.split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(|tag| Value::String(tag.to_string()))
                .collect(),
        ),
        _ => Value::Array(Vec::new()),
    }
}
