use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::db::{DbStartup, NewStartup};
use crate::error::RegistryError;

/// Body of `POST /api/v1/startups/`. Unknown keys, `user_id` included, are
/// ignored; the owner always comes from the authenticated caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStartupRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub founder: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub founded_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
}

impl CreateStartupRequest {
    pub fn into_new(self, owner: &str) -> NewStartup {
        NewStartup {
            name: self.name,
            description: self.description,
            founder: self.founder,
            industry: self.industry,
            founded_date: self.founded_date,
            status: self.status,
            user_id: owner.to_string(),
        }
    }
}

/// Reply to a successful create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub message: String,
    pub startup_id: i64,
}

/// Listing representation; owner and date are rendered as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupView {
    pub startup_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub founder: Option<String>,
    pub industry: Option<String>,
    pub status: Option<String>,
    pub founded_date: Option<String>,
    pub user_id: Option<String>,
}

impl From<DbStartup> for StartupView {
    fn from(s: DbStartup) -> Self {
        Self {
            startup_id: s.startup_id,
            name: s.name,
            description: s.description,
            founder: s.founder,
            industry: s.industry,
            status: s.status,
            founded_date: s.founded_date.map(|d| d.to_string()),
            user_id: s.user_id,
        }
    }
}

/// Fields a `PUT` may touch. Ids, owner and timestamps are not writable.
pub const MUTABLE_FIELDS: [&str; 6] = [
    "name",
    "description",
    "founder",
    "industry",
    "founded_date",
    "status",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldUpdate {
    Name(String),
    Description(Option<String>),
    Founder(Option<String>),
    Industry(Option<String>),
    FoundedDate(Option<NaiveDate>),
    Status(Option<String>),
}

/// Validated update. Built all-or-nothing, so a rejected body never
/// touches the row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupPatch {
    updates: Vec<FieldUpdate>,
}

impl StartupPatch {
    pub fn from_json(body: Map<String, Value>) -> Result<Self, RegistryError> {
        let updates = body
            .into_iter()
            .map(|(key, value)| parse_field(key, value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { updates })
    }

    pub fn apply(self, row: &mut DbStartup) {
        for update in self.updates {
            match update {
                FieldUpdate::Name(v) => row.name = v,
                FieldUpdate::Description(v) => row.description = v,
                FieldUpdate::Founder(v) => row.founder = v,
                FieldUpdate::Industry(v) => row.industry = v,
                FieldUpdate::FoundedDate(v) => row.founded_date = v,
                FieldUpdate::Status(v) => row.status = v,
            }
        }
    }
}

fn parse_field(key: String, value: Value) -> Result<FieldUpdate, RegistryError> {
    let update = match key.as_str() {
        "name" => match value {
            Value::String(s) => FieldUpdate::Name(s),
            _ => return Err(invalid(key, "expected a string")),
        },
        "description" => FieldUpdate::Description(optional_string(&key, value)?),
        "founder" => FieldUpdate::Founder(optional_string(&key, value)?),
        "industry" => FieldUpdate::Industry(optional_string(&key, value)?),
        "status" => FieldUpdate::Status(optional_string(&key, value)?),
        "founded_date" => {
            let date = optional_string(&key, value)?
                .map(|s| {
                    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                        .map_err(|_| invalid(key.clone(), "expected a YYYY-MM-DD date"))
                })
                .transpose()?;
            FieldUpdate::FoundedDate(date)
        }
        _ => return Err(RegistryError::UnknownField(key)),
    };
    Ok(update)
}

fn optional_string(key: &str, value: Value) -> Result<Option<String>, RegistryError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        _ => Err(invalid(key.to_string(), "expected a string or null")),
    }
}

fn invalid(field: String, reason: &str) -> RegistryError {
    RegistryError::InvalidField {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn row() -> DbStartup {
        DbStartup {
            startup_id: 7,
            name: "Acme".to_string(),
            description: Some("old".to_string()),
            founder: None,
            industry: None,
            founded_date: None,
            status: None,
            created_at: Utc::now(),
            updated_at: None,
            user_id: Some("owner".to_string()),
        }
    }

    fn object(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn allowed_fields_are_applied() {
        let patch = StartupPatch::from_json(object(json!({
            "name": "Acme Labs",
            "description": null,
            "founded_date": "2020-02-29",
            "status": "series-a"
        })))
        .unwrap();

        let mut r = row();
        patch.apply(&mut r);
        assert_eq!(r.name, "Acme Labs");
        assert_eq!(r.description, None);
        assert_eq!(r.founded_date, NaiveDate::from_ymd_opt(2020, 2, 29));
        assert_eq!(r.status.as_deref(), Some("series-a"));
        assert_eq!(r.user_id.as_deref(), Some("owner"));
    }

    #[test]
    fn every_mutable_field_accepts_a_string() {
        for key in MUTABLE_FIELDS {
            let value = if key == "founded_date" { "2022-01-01" } else { "v" };
            let mut body = Map::new();
            body.insert(key.to_string(), json!(value));
            assert!(StartupPatch::from_json(body).is_ok(), "{key}");
        }
    }

    #[test]
    fn immutable_keys_are_rejected() {
        for key in ["startup_id", "user_id", "created_at", "updated_at", "bogus"] {
            let mut body = object(json!({ "status": "x" }));
            body.insert(key.to_string(), json!("y"));
            let err = StartupPatch::from_json(body).unwrap_err();
            assert!(
                matches!(&err, RegistryError::UnknownField(k) if k == key),
                "{key}: {err}"
            );
        }
    }

    #[test]
    fn type_errors_are_rejected() {
        assert!(StartupPatch::from_json(object(json!({ "name": null }))).is_err());
        assert!(StartupPatch::from_json(object(json!({ "founder": 3 }))).is_err());
        assert!(StartupPatch::from_json(object(json!({ "founded_date": "03/14/2021" }))).is_err());
    }

    #[test]
    fn listing_view_renders_strings() {
        let mut r = row();
        r.founded_date = NaiveDate::from_ymd_opt(2019, 1, 5);
        let view = StartupView::from(r);
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["startup_id"], 7);
        assert_eq!(value["founded_date"], "2019-01-05");
        assert_eq!(value["user_id"], "owner");
        assert_eq!(value["founder"], Value::Null);
    }

    #[test]
    fn create_request_ignores_owner_in_body() {
        let req: CreateStartupRequest = serde_json::from_value(json!({
            "name": "Acme",
            "user_id": "someone-else",
            "founded_date": "2021-03-14"
        }))
        .unwrap();
        let new = req.into_new("caller");
        assert_eq!(new.user_id, "caller");
        assert_eq!(new.founded_date, NaiveDate::from_ymd_opt(2021, 3, 14));
    }
}
