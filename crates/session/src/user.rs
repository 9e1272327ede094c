use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillpath_auth::Session;

/// アプリケーションから見たユーザー
///
/// The provider's session record projected into the application's own
/// shape. Serialized form matches the snapshot the web client wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub visual_points: i64,
    #[serde(default)]
    pub textual_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppUser {
    /// セッションからユーザーを導出
    ///
    /// Learning points are reset to zero on every hydration and
    /// `updated_at` is stamped with the current time, never carried over.
    pub fn from_session(session: &Session) -> Self {
        let record = &session.user;
        let meta = &record.user_metadata;

        let name = meta
            .get("name")
            .and_then(|v| v.as_str())
            .or_else(|| meta.get("full_name").and_then(|v| v.as_str()))
            .unwrap_or_default()
            .to_string();

        let skills = meta
            .get("skills")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let created_at = record
            .created_at
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now());

        Self {
            id: record.id.clone(),
            name,
            email: record.email.clone().unwrap_or_default(),
            skills,
            visual_points: 0,
            textual_points: 0,
            created_at,
            updated_at: Utc::now(),
        }
    }
}
