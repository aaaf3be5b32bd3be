use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DbStartup {
    pub startup_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub founder: Option<String>,
    pub industry: Option<String>,
    pub founded_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub user_id: Option<String>,
}

impl DbStartup {
    pub fn is_owned_by(&self, identity: &str) -> bool {
        self.user_id.as_deref() == Some(identity)
    }
}

/// Insert payload; the owner is always the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStartup {
    pub name: String,
    pub description: Option<String>,
    pub founder: Option<String>,
    pub industry: Option<String>,
    pub founded_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub user_id: String,
}
