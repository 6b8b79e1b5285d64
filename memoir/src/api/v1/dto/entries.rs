//! Journal entry DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{DateRange, Era, JournalEntry};

use super::common::EraDto;

/// Query parameters for `GET /api/v1/entries`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListEntriesQuery {
    /// First year to include.
    pub year_start: Option<i32>,
    /// Last year to include.
    pub year_end: Option<i32>,
}

impl ListEntriesQuery {
    pub fn era(&self) -> EraDto {
        EraDto {
            year_start: self.year_start,
            year_end: self.year_end,
            label: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub id: i64,
    pub content: String,
    /// The diary's reply, or a placeholder if generation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl From<JournalEntry> for EntryResponse {
    fn from(entry: JournalEntry) -> Self {
        Self {
            id: entry.id,
            content: entry.content,
            ai_response: entry.ai_response,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeResponse {
    /// `YYYY-MM-DD` of the oldest entry.
    pub first: String,
    pub last: String,
}

impl From<DateRange> for DateRangeResponse {
    fn from(range: DateRange) -> Self {
        Self {
            first: range.first,
            last: range.last,
        }
    }
}

/// Response for `GET /api/v1/entries`. Entries are oldest first.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListEntriesResponse {
    pub entries: Vec<EntryResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRangeResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub era: Option<EraDto>,
}

impl ListEntriesResponse {
    pub fn new(entries: Vec<JournalEntry>, era: &Era) -> Self {
        let date_range = DateRange::of(&entries).map(Into::into);
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
            date_range,
            era: (!era.is_unbounded()).then(|| era.clone().into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(id: i64, year: i32) -> JournalEntry {
        JournalEntry {
            id,
            content: format!("entry {id}"),
            ai_response: Some("reply".to_string()),
            created_at: Utc.with_ymd_and_hms(year, 6, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn query_deserializes_camel_case() {
        let query: ListEntriesQuery =
            serde_json::from_str(r#"{"yearStart": 2020}"#).expect("deserialize");
        assert_eq!(query.year_start, Some(2020));
        assert!(query.year_end.is_none());
    }

    #[test]
    fn list_response_carries_date_range() {
        let resp = ListEntriesResponse::new(vec![entry(1, 2020), entry(2, 2023)], &Era::default());
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["dateRange"]["first"], "2020-06-01");
        assert_eq!(json["dateRange"]["last"], "2023-06-01");
        assert_eq!(json["entries"][0]["aiResponse"], "reply");
        assert!(json.get("era").is_none());
    }

    #[test]
    fn empty_list_has_no_date_range() {
        let resp = ListEntriesResponse::new(Vec::new(), &Era::default());
        assert!(resp.date_range.is_none());
    }
}
