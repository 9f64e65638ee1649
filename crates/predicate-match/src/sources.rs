//! Response bodies of the predicate-search and PDF-extraction endpoints.
//!
//! Transport is the caller's business: these types decode bodies that have
//! already been received and turn them into [`DeviceRecord`]s.

use predicate_core::{DeviceRecord, concrete, is_placeholder};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::clearance::{ClearanceNumber, clearance_key};
use crate::error::Result;

/// Name given to an extracted record when the PDF yields none.
pub const UPLOADED_DEVICE_NAME: &str = "Uploaded Device";

/// Product code too generic to narrow a search; results are accumulated.
const GENERIC_PRODUCT_CODE: &str = "LLC";

const MIN_QUERY_LEN: usize = 3;

// ─── Search query ──────────────────────────────────────────

/// A parsed predicate search. Either a 510(k) number lookup or a product
/// code followed by free-text description words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub clearance_number: Option<ClearanceNumber>,
    pub product_code: Option<String>,
    pub description: String,
}

/// Request body for the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub product_code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k_number: Option<String>,
}

impl SearchQuery {
    /// Returns `None` for queries too short to search.
    pub fn parse(raw: &str, fallback_product_code: Option<&str>) -> Option<Self> {
        if raw.chars().count() < MIN_QUERY_LEN {
            return None;
        }

        let trimmed = raw.trim();
        let fallback = concrete(fallback_product_code).map(str::to_string);

        if let Ok(number) = ClearanceNumber::parse(trimmed) {
            return Some(Self {
                clearance_number: Some(number),
                product_code: fallback,
                description: String::new(),
            });
        }

        let mut words = trimmed.split_whitespace();
        let product_code = words.next().map(str::to_string).or(fallback);
        Some(Self {
            clearance_number: None,
            product_code,
            description: words.collect::<Vec<_>>().join(" "),
        })
    }

    /// Whether results should be merged into the working set instead of replacing it.
    pub fn accumulates(&self) -> bool {
        if self.clearance_number.is_some() {
            return true;
        }
        match concrete(self.product_code.as_deref()) {
            None => true,
            Some(code) => code.eq_ignore_ascii_case(GENERIC_PRODUCT_CODE),
        }
    }

    pub fn to_request(&self) -> SearchRequest {
        SearchRequest {
            product_code: self
                .product_code
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            description: self.description.clone(),
            k_number: self.clearance_number.as_ref().map(|n| n.normalized.clone()),
        }
    }
}

// ─── Search response ───────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub devices: Vec<SearchDevice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchDevice {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub k_number: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub clearance_date: Option<String>,
    #[serde(default)]
    pub regulation_number: Option<String>,
    #[serde(default)]
    pub device_description: Option<String>,
}

impl SearchResponse {
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn into_records(self, query: &SearchQuery) -> Vec<DeviceRecord> {
        self.devices
            .into_iter()
            .map(|device| device.into_record(query))
            .collect()
    }
}

impl SearchDevice {
    fn into_record(self, query: &SearchQuery) -> DeviceRecord {
        let key = self.k_number.as_deref().and_then(clearance_key);
        DeviceRecord {
            id: key.clone().unwrap_or_else(|| generated_id("search")),
            device_name: self.name.unwrap_or_default(),
            clearance_key: key,
            manufacturer: known(self.manufacturer),
            regulation_number: known(self.regulation_number),
            clearance_date: known(self.clearance_date),
            product_code: known(query.product_code.clone()),
            // the search endpoint only returns class II predicates
            device_class: Some("II".to_string()),
            device_description: known(self.device_description),
            ..Default::default()
        }
    }
}

// ─── PDF extraction ────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PdfExtraction {
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub k_number: Option<String>,
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub regulation_number: Option<String>,
    #[serde(default)]
    pub clearance_date: Option<String>,
    #[serde(default)]
    pub intended_use: Option<String>,
    #[serde(default)]
    pub technology: Option<String>,
    #[serde(default)]
    pub performance_claims: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub device_description: Option<String>,
}

impl PdfExtraction {
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn into_record(self, fallback_product_code: Option<&str>) -> DeviceRecord {
        let key = self.k_number.as_deref().and_then(clearance_key);
        let regulation_number = known(self.regulation_number);
        let device_name = known(self.device_name).unwrap_or_else(|| UPLOADED_DEVICE_NAME.to_string());

        DeviceRecord {
            id: key.clone().unwrap_or_else(|| generated_id("uploaded")),
            device_name,
            clearance_key: key,
            product_code: known(self.product_code)
                .or_else(|| concrete(fallback_product_code).map(str::to_string)),
            device_class: regulation_number.as_ref().map(|_| "II".to_string()),
            regulation_number,
            clearance_date: known(self.clearance_date),
            intended_use: known(self.intended_use),
            technology: known(self.technology),
            performance_summary: known(self.performance_claims),
            manufacturer: known(self.manufacturer),
            device_description: known(self.device_description),
            added_to_comparison: false,
        }
    }
}

fn known(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !is_placeholder(v))
}

fn generated_id(prefix: &str) -> String {
    format!("{prefix}-{}", Ulid::new().to_string().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_queries_are_rejected() {
        assert!(SearchQuery::parse("ab", None).is_none());
        assert!(SearchQuery::parse("abc", None).is_some());
    }

    #[test]
    fn k_number_query() {
        let query = SearchQuery::parse(" k123456 ", Some("QKO")).unwrap();
        assert_eq!(
            query.clearance_number.as_ref().map(|n| n.normalized.as_str()),
            Some("K123456")
        );
        assert_eq!(query.product_code.as_deref(), Some("QKO"));
        assert!(query.accumulates());

        let request = query.to_request();
        assert_eq!(request.k_number.as_deref(), Some("K123456"));
        assert_eq!(request.product_code, "QKO");
        assert_eq!(request.description, "");
    }

    #[test]
    fn product_code_query() {
        let query = SearchQuery::parse("QKO rapid influenza  antigen", None).unwrap();
        assert_eq!(query.product_code.as_deref(), Some("QKO"));
        assert_eq!(query.description, "rapid influenza antigen");
        assert!(!query.accumulates());

        let json = serde_json::to_value(query.to_request()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"product_code": "QKO", "description": "rapid influenza antigen"})
        );
    }

    #[test]
    fn generic_or_unknown_product_code_accumulates() {
        assert!(SearchQuery::parse("llc dental", None).unwrap().accumulates());
        assert!(SearchQuery::parse("Unknown thing", None).unwrap().accumulates());

        let blank = SearchQuery::parse("   ", Some("Unknown")).unwrap();
        assert_eq!(blank.product_code, None);
        assert!(blank.accumulates());
        assert_eq!(blank.to_request().product_code, "Unknown");
    }

    #[test]
    fn search_response_maps_fields() {
        let body = r#"{
            "devices": [
                {"name": "QuickVue Influenza A+B Test", "k_number": "k123456",
                 "manufacturer": "Quidel", "clearance_date": "2011-03-04",
                 "regulation_number": "866.3330", "device_description": "N/A"},
                {"name": null, "manufacturer": "Unknown"}
            ]
        }"#;
        let query = SearchQuery::parse("QKO influenza", None).unwrap();
        let records = SearchResponse::from_json(body).unwrap().into_records(&query);

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.id, "K123456");
        assert_eq!(first.clearance_key.as_deref(), Some("K123456"));
        assert_eq!(first.manufacturer.as_deref(), Some("Quidel"));
        assert_eq!(first.product_code.as_deref(), Some("QKO"));
        assert_eq!(first.device_class.as_deref(), Some("II"));
        assert_eq!(first.device_description, None);
        assert!(!first.added_to_comparison);

        let second = &records[1];
        assert!(second.id.starts_with("search-"));
        assert_eq!(second.device_name, "");
        assert_eq!(second.clearance_key, None);
        assert_eq!(second.manufacturer, None);
    }

    #[test]
    fn empty_search_body() {
        let query = SearchQuery::parse("QKO", None).unwrap();
        assert!(SearchResponse::from_json("{}").unwrap().into_records(&query).is_empty());
        assert!(SearchResponse::from_json("not json").is_err());
    }

    #[test]
    fn pdf_extraction_maps_fields() {
        let body = r#"{
            "device_name": "Sofia Influenza A+B FIA",
            "k_number": "K654321",
            "regulation_number": "866.3330",
            "intended_use": "Qualitative detection of influenza A and B antigens",
            "performance_claims": "Sensitivity 90%",
            "technology": "Unknown"
        }"#;
        let record = PdfExtraction::from_json(body).unwrap().into_record(Some("QKO"));

        assert_eq!(record.id, "K654321");
        assert_eq!(record.device_name, "Sofia Influenza A+B FIA");
        assert_eq!(record.product_code.as_deref(), Some("QKO"));
        assert_eq!(record.device_class.as_deref(), Some("II"));
        assert_eq!(record.performance_summary.as_deref(), Some("Sensitivity 90%"));
        assert_eq!(record.technology, None);
    }

    #[test]
    fn pdf_extraction_defaults() {
        let record = PdfExtraction::from_json("{}").unwrap().into_record(None);
        assert!(record.id.starts_with("uploaded-"));
        assert_eq!(record.device_name, UPLOADED_DEVICE_NAME);
        assert_eq!(record.clearance_key, None);
        assert_eq!(record.device_class, None);
        assert_eq!(record.product_code, None);
    }
}
