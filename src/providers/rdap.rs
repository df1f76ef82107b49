//! Domain registration lookup over RDAP
//!
//! rdap.org redirects to the authoritative registry server for the TLD.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::types::{EntityKind, ResolvedEntity, SourceTier};
use crate::utils::constants::RDAP_BASE_URL;

use super::adapter::{AdapterOutcome, IntelAdapter, Unavailable};
use super::http::SourceClient;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainRecord {
    pub domain: String,
    pub registered_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub registrar: Option<String>,
    /// Registrant contact hidden behind a privacy service
    pub privacy_redacted: bool,
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdapDomain {
    #[serde(default)]
    pub events: Vec<RdapEvent>,
    #[serde(default)]
    pub entities: Vec<RdapEntity>,
    #[serde(default)]
    pub remarks: Vec<RdapRemark>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdapEvent {
    pub event_action: String,
    pub event_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdapEntity {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub vcard_array: Value,
}

impl RdapEntity {
    /// Formatted name (`fn`) from the jCard
    fn formatted_name(&self) -> Option<String> {
        self.vcard_array
            .get(1)?
            .as_array()?
            .iter()
            .find(|prop| prop.get(0).and_then(Value::as_str) == Some("fn"))?
            .get(3)?
            .as_str()
            .map(str::to_string)
    }

    fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

#[derive(Debug, Deserialize)]
pub struct RdapRemark {
    pub title: Option<String>,
    #[serde(default)]
    pub description: Vec<String>,
}

fn mentions_redaction(text: &str) -> bool {
    let lowered = text.to_lowercase();
    lowered.contains("redact") || lowered.contains("privacy")
}

impl RdapDomain {
    pub fn into_record(self, domain: &str, url: String) -> DomainRecord {
        let event = |action: &str| {
            self.events
                .iter()
                .find(|e| e.event_action.eq_ignore_ascii_case(action))
                .and_then(|e| e.event_date)
        };

        let registrar = self
            .entities
            .iter()
            .find(|e| e.has_role("registrar"))
            .and_then(RdapEntity::formatted_name);

        let registrant_hidden = self
            .entities
            .iter()
            .filter(|e| e.has_role("registrant"))
            .filter_map(RdapEntity::formatted_name)
            .any(|name| mentions_redaction(&name));
        let remark_hidden = self.remarks.iter().any(|r| {
            r.title.as_deref().is_some_and(mentions_redaction)
                || r.description.iter().any(|d| mentions_redaction(d))
        });

        DomainRecord {
            domain: domain.to_string(),
            registered_at: event("registration"),
            expires_at: event("expiration"),
            registrar,
            privacy_redacted: registrant_hidden || remark_hidden,
            url,
        }
    }
}

/// `domain-registration` adapter
pub struct DomainRegistrationAdapter {
    http: SourceClient,
}

impl DomainRegistrationAdapter {
    pub fn new(http: SourceClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl IntelAdapter for DomainRegistrationAdapter {
    fn id(&self) -> &'static str {
        "domain-registration"
    }

    fn tier(&self) -> SourceTier {
        SourceTier::Api
    }

    fn applies_to(&self) -> &'static [EntityKind] {
        &[EntityKind::Domain]
    }

    async fn fetch(&self, entity: &ResolvedEntity) -> AdapterOutcome {
        let domain = &entity.normalized_value;
        let url = format!("{}/domain/{}", RDAP_BASE_URL, domain);
        match self.http.get_json::<RdapDomain>("rdap", &url, &[]).await {
            Ok(rdap) => AdapterOutcome::Available(rdap.into_record(domain, url).into()),
            Err(e) => AdapterOutcome::Unavailable(Unavailable::from(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rdap_fixture() {
        let json = r#"{
            "objectClassName": "domain",
            "ldhName": "LARP.EXAMPLE",
            "events": [
                {"eventAction": "registration", "eventDate": "2024-03-01T10:00:00Z"},
                {"eventAction": "expiration", "eventDate": "2025-03-01T10:00:00Z"},
                {"eventAction": "last update of RDAP database", "eventDate": "2024-05-01T00:00:00Z"}
            ],
            "entities": [
                {
                    "objectClassName": "entity",
                    "roles": ["registrar"],
                    "vcardArray": ["vcard", [["version", {}, "text", "4.0"], ["fn", {}, "text", "NameCheap, Inc."]]]
                },
                {
                    "roles": ["registrant"],
                    "vcardArray": ["vcard", [["fn", {}, "text", "Redacted for Privacy"]]]
                }
            ]
        }"#;
        let rdap: RdapDomain = serde_json::from_str(json).unwrap();
        let record = rdap.into_record("larp.example", "https://rdap.org/domain/larp.example".into());

        assert_eq!(record.registrar.as_deref(), Some("NameCheap, Inc."));
        assert_eq!(
            record.registered_at.unwrap().to_rfc3339(),
            "2024-03-01T10:00:00+00:00"
        );
        assert!(record.expires_at.is_some());
        assert!(record.privacy_redacted);
    }

    #[test]
    fn test_rdap_without_entities() {
        let rdap: RdapDomain = serde_json::from_str(r#"{"events": []}"#).unwrap();
        let record = rdap.into_record("a.io", String::new());
        assert_eq!(record.registered_at, None);
        assert_eq!(record.registrar, None);
        assert!(!record.privacy_redacted);
    }
}
