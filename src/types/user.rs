use serde::{Deserialize, Serialize};
use serde_json::Value;

/// User profile from Microsoft Graph
///
/// Every field is optional: a profile record is displayed, never validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub business_phones: Option<Vec<String>>,
    pub given_name: Option<String>,
    pub job_title: Option<String>,
    pub mail: Option<String>,
    pub mobile_phone: Option<String>,
    pub office_location: Option<String>,
    pub preferred_language: Option<String>,
    pub surname: Option<String>,
    pub user_principal_name: Option<String>,
}

impl Profile {
    /// Pick the known fields out of a raw profile record.
    pub fn from_record(record: &Value) -> Self {
        serde_json::from_value(record.clone()).unwrap_or_default()
    }

    /// Name to fall back on when no photo is available.
    pub fn avatar_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .or(self.user_principal_name.as_deref())
            .or(self.mail.as_deref())
    }
}
