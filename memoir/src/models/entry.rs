use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A saved journal entry. Entries are never edited once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: i64,
    pub content: String,
    pub ai_response: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    /// `YYYY-MM-DD` of the entry, as quoted in prompts.
    pub fn date_label(&self) -> String {
        self.created_at.format("%Y-%m-%d").to_string()
    }
}

/// An inclusive range of years the past self is allowed to remember.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Era {
    pub year_start: Option<i32>,
    pub year_end: Option<i32>,
    pub label: Option<String>,
}

impl Era {
    pub fn is_unbounded(&self) -> bool {
        self.year_start.is_none() && self.year_end.is_none()
    }

    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        let year = at.year();
        self.year_start.map_or(true, |start| year >= start)
            && self.year_end.map_or(true, |end| year <= end)
    }

    /// Half-open `[from, until)` instants covering the era's years.
    pub fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let new_year = |year: i32| Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single();
        let from = self.year_start.and_then(new_year);
        let until = self
            .year_end
            .and_then(|end| end.checked_add(1))
            .and_then(new_year);
        (from, until)
    }

    pub fn filter(&self, entries: Vec<JournalEntry>) -> Vec<JournalEntry> {
        if self.is_unbounded() {
            return entries;
        }
        entries
            .into_iter()
            .filter(|e| self.contains(&e.created_at))
            .collect()
    }
}

/// First and last entry dates, shown when talking to the past self.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub first: String,
    pub last: String,
}

impl DateRange {
    pub fn of(entries: &[JournalEntry]) -> Option<Self> {
        let first = entries.first()?;
        let last = entries.last()?;
        Some(Self {
            first: first.date_label(),
            last: last.date_label(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, year: i32) -> JournalEntry {
        JournalEntry {
            id,
            content: format!("entry {id}"),
            ai_response: None,
            created_at: Utc.with_ymd_and_hms(year, 3, 14, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_era_filters_inclusive_years() {
        let entries = vec![entry(1, 2019), entry(2, 2020), entry(3, 2021), entry(4, 2022)];
        let era = Era {
            year_start: Some(2020),
            year_end: Some(2021),
            label: Some("university".into()),
        };

        let ids: Vec<i64> = era.filter(entries).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_open_ended_era() {
        let era = Era {
            year_start: None,
            year_end: Some(2020),
            label: None,
        };
        assert!(era.contains(&entry(1, 1999).created_at));
        assert!(!era.contains(&entry(1, 2021).created_at));
        assert_eq!(Era::default().filter(vec![entry(1, 2001)]).len(), 1);
    }

    #[test]
    fn test_bounds_cover_whole_years() {
        let era = Era {
            year_start: Some(2019),
            year_end: Some(2019),
            label: None,
        };
        let (from, until) = era.bounds();
        assert_eq!(from, Some(Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(until, Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(Era::default().bounds(), (None, None));
    }

    #[test]
    fn test_date_range() {
        assert!(DateRange::of(&[]).is_none());
        let range = DateRange::of(&[entry(1, 2020), entry(2, 2023)]).unwrap();
        assert_eq!(range.first, "2020-03-14");
        assert_eq!(range.last, "2023-03-14");
    }
}
