mod entries;
mod memories;
mod profile;
mod tags;

pub use entries::EntryRepository;
pub use memories::MemoryRecordRepository;
pub use profile::ProfileRepository;
pub use tags::TagRepository;

use chrono::{DateTime, SecondsFormat, Utc};

/// Fixed-width UTC timestamp so lexical order matches chronological order.
pub(crate) fn db_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_db_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
pub(crate) async fn test_connection() -> libsql::Connection {
    let db = libsql::Builder::new_local(":memory:")
        .build()
        .await
        .expect("in-memory database");
    let conn = db.connect().expect("connection");
    crate::db::schema::init_schema(&conn, 3)
        .await
        .expect("schema");
    conn
}
