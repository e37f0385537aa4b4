//! Core types for the BioCloudLabs client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cached profile of the logged-in user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub surname: String,
    pub role_id: i64,
    pub credits: i64,
    pub location_id: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        match (self.name.is_empty(), self.surname.is_empty()) {
            (true, _) => self.email.clone(),
            (false, true) => self.name.clone(),
            (false, false) => format!("{} {}", self.name, self.surname),
        }
    }
}

/// Bearer token plus the profile it was issued for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub profile: UserProfile,
}

impl Session {
    pub fn new(token: impl Into<String>, profile: UserProfile) -> Self {
        Self {
            token: token.into(),
            profile,
        }
    }

    /// Same token, new profile
    pub fn with_profile(&self, profile: UserProfile) -> Self {
        Self {
            token: self.token.clone(),
            profile,
        }
    }
}

/// Body of a successful login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(flatten)]
    pub profile: UserProfile,
}

/// A virtual machine the user has launched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualMachineRecord {
    pub id: i64,
    pub name: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub powered_off_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cost: f64,
}

impl VirtualMachineRecord {
    pub fn is_running(&self) -> bool {
        self.powered_off_at.is_none()
    }

    /// A powered-off time before creation breaks the record invariant
    pub fn is_consistent(&self) -> bool {
        self.powered_off_at.map_or(true, |off| off >= self.created_at)
    }
}

/// Response of a VM setup request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionedVm {
    pub dns: String,
    pub ip: String,
    #[serde(default)]
    pub price: Option<f64>,
}

/// A credit package for sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub name: String,
    /// Formatted with currency, e.g. "10.00 €"
    pub price: String,
    pub price_id: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Region reference data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
}

/// Fixed VM configurations a job can run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmTier {
    Small,
    Medium,
    Large,
}

impl VmTier {
    pub const ALL: [VmTier; 3] = [VmTier::Small, VmTier::Medium, VmTier::Large];

    pub fn label(&self) -> &'static str {
        match self {
            VmTier::Small => "VM1",
            VmTier::Medium => "VM2",
            VmTier::Large => "VM3",
        }
    }

    pub fn cpus(&self) -> u32 {
        match self {
            VmTier::Small => 2,
            VmTier::Medium => 4,
            VmTier::Large => 8,
        }
    }

    pub fn memory_gb(&self) -> u32 {
        match self {
            VmTier::Small => 8,
            VmTier::Medium => 16,
            VmTier::Large => 32,
        }
    }

    /// Credits charged for launching a VM of this tier
    pub fn credits(&self) -> i64 {
        match self {
            VmTier::Small => 1,
            VmTier::Medium => 2,
            VmTier::Large => 3,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            VmTier::Small => "Short queries against small databases",
            VmTier::Medium => "Typical nucleotide and protein searches",
            VmTier::Large => "Large databases and batch query sets",
        }
    }
}

impl std::fmt::Display for VmTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for VmTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "small" | "vm1" => Ok(VmTier::Small),
            "medium" | "vm2" => Ok(VmTier::Medium),
            "large" | "vm3" => Ok(VmTier::Large),
            other => Err(format!("unknown VM tier '{}'", other)),
        }
    }
}

/// Lenient timestamp (de)serialization.
///
/// The backend may send RFC 3339, RFC 2822 (`Tue, 19 Mar 2024 10:00:00 GMT`)
/// or a naive `YYYY-MM-DD HH:MM:SS` that is taken as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        let value = value.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_login_response_with_token_only() {
        let resp: LoginResponse = serde_json::from_str(r#"{"access_token": "abc"}"#).unwrap();
        assert_eq!(resp.access_token, "abc");
        assert_eq!(resp.profile, UserProfile::default());
    }

    #[test]
    fn test_login_response_with_profile_fields() {
        let resp: LoginResponse = serde_json::from_str(
            r#"{"access_token": "abc", "id": 7, "email": "ana@example.com", "name": "Ana", "credits": 4}"#,
        )
        .unwrap();
        assert_eq!(resp.profile.id, 7);
        assert_eq!(resp.profile.credits, 4);
        assert_eq!(resp.profile.display_name(), "Ana");
    }

    #[test]
    fn test_vm_record_backend_formats() {
        let record: VirtualMachineRecord = serde_json::from_str(
            r#"{"id": 1, "name": "vm-1.westeurope.cloudapp.azure.com",
                "created_at": "Tue, 19 Mar 2024 10:00:00 GMT",
                "powered_off_at": "2024-03-19 12:30:00"}"#,
        )
        .unwrap();
        assert_eq!(record.created_at, Utc.with_ymd_and_hms(2024, 3, 19, 10, 0, 0).unwrap());
        assert_eq!(
            record.powered_off_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 19, 12, 30, 0).unwrap())
        );
        assert!(!record.is_running());
        assert!(record.is_consistent());
        assert_eq!(record.cost, 0.0);
    }

    #[test]
    fn test_vm_record_running_when_null() {
        let record: VirtualMachineRecord = serde_json::from_str(
            r#"{"id": 2, "name": "vm-2", "created_at": "2024-03-19T10:00:00Z", "powered_off_at": null, "cost": 2}"#,
        )
        .unwrap();
        assert!(record.is_running());
        assert_eq!(record.cost, 2.0);
    }

    #[test]
    fn test_tier_costs_and_parsing() {
        assert_eq!("vm3".parse::<VmTier>().unwrap(), VmTier::Large);
        assert_eq!("Medium".parse::<VmTier>().unwrap(), VmTier::Medium);
        assert!("xl".parse::<VmTier>().is_err());
        assert!(VmTier::ALL.windows(2).all(|w| w[0].credits() < w[1].credits()));
    }
}
