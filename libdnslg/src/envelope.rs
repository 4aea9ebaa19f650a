//! JSON envelopes returned by looking-glass instances. Only the fields we
//! report are modelled; everything else in the reply is ignored.

use serde::{Deserialize, Deserializer};

/// Some instances send `null` for absent sections.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HealthEnvelope {
    #[serde(rename = "Query", default, deserialize_with = "null_as_default")]
    pub query: QuerySection,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QuerySection {
    #[serde(rename = "Versions", default, deserialize_with = "null_as_default")]
    pub versions: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AddressEnvelope {
    #[serde(rename = "AnswerSection", default, deserialize_with = "null_as_default")]
    pub answers: Vec<Answer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Answer {
    #[serde(rename = "Address")]
    pub address: Option<String>,
}

impl AddressEnvelope {
    /// Addresses in answer order. CNAME and other address-less entries are skipped.
    pub fn into_addresses(self) -> Vec<String> {
        self.answers.into_iter().filter_map(|a| a.address).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_ignores_unknown_fields() {
        let body = r#"{
            "ReturnCode": "NOERROR",
            "Query": {"Server": "::1", "Time": "2013-02-14", "Versions": "DNS-LG 2013-02-14"},
            "AnswerSection": [{"Type": "NS", "Target": "a.iana-servers.net."}]
        }"#;
        let envelope: HealthEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.query.versions, "DNS-LG 2013-02-14");
    }

    #[test]
    fn health_missing_query_defaults() {
        let envelope: HealthEnvelope = serde_json::from_str("{}").unwrap();
        assert_eq!(envelope.query.versions, "");
    }

    #[test]
    fn null_sections_default() {
        let envelope: HealthEnvelope = serde_json::from_str(r#"{"Query": null}"#).unwrap();
        assert_eq!(envelope.query.versions, "");
        let envelope: HealthEnvelope = serde_json::from_str(r#"{"Query": {"Versions": null}}"#).unwrap();
        assert_eq!(envelope.query.versions, "");
        let envelope: AddressEnvelope =
            serde_json::from_str(r#"{"ReturnCode": "NXDOMAIN", "AnswerSection": null}"#).unwrap();
        assert!(envelope.into_addresses().is_empty());
    }

    #[test]
    fn addresses_skip_entries_without_address() {
        let body = r#"{
            "AnswerSection": [
                {"Type": "CNAME", "Target": "www.example.net.", "TTL": 300},
                {"Type": "A", "Address": "192.0.2.10", "TTL": 300},
                {"Type": "AAAA", "Address": "2001:db8::10", "TTL": 300}
            ]
        }"#;
        let envelope: AddressEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.into_addresses(), vec!["192.0.2.10", "2001:db8::10"]);
    }
}
