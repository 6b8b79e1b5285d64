use chrono::Utc;
use libsql::{params, Connection};

use super::db_timestamp;
use crate::error::Result;
use crate::models::{keys, Profile};

pub struct ProfileRepository;

impl ProfileRepository {
    pub async fn get_all(conn: &Connection) -> Result<Profile> {
        let mut rows = conn
            .query("SELECT key, value FROM profile ORDER BY id", ())
            .await?;

        let mut profile = Profile::new();
        while let Some(row) = rows.next().await? {
            profile.insert(row.get::<String>(0)?, row.get::<String>(1)?);
        }
        Ok(profile)
    }

    pub async fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO profile (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, db_timestamp(&Utc::now())],
        )
        .await?;
        Ok(())
    }

    /// Writes every pair in one transaction.
    pub async fn set_many(conn: &Connection, pairs: &[(String, String)]) -> Result<()> {
        let tx = conn.transaction().await?;
        let now = db_timestamp(&Utc::now());
        for (key, value) in pairs {
            tx.execute(
                "INSERT INTO profile (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key.as_str(), value.as_str(), now.as_str()],
            )
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn is_complete(conn: &Connection) -> Result<bool> {
        let mut rows = conn
            .query(
                "SELECT value FROM profile WHERE key = ?1",
                params![keys::ONBOARDING_COMPLETE],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(row.get::<String>(0)? == "true"),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_connection;

    #[tokio::test]
    async fn test_set_is_last_write_wins() {
        let conn = test_connection().await;

        ProfileRepository::set(&conn, "consent", "false").await.unwrap();
        ProfileRepository::set(&conn, "consent", "true").await.unwrap();

        let profile = ProfileRepository::get_all(&conn).await.unwrap();
        assert_eq!(profile.get("consent"), Some("true"));
        assert_eq!(profile.as_map().len(), 1);
    }

    #[tokio::test]
    async fn test_is_complete_tracks_onboarding_flag() {
        let conn = test_connection().await;
        assert!(!ProfileRepository::is_complete(&conn).await.unwrap());

        ProfileRepository::set_many(
            &conn,
            &[
                (keys::NAME_AND_LIFE_STAGE.to_string(), "Ana".to_string()),
                (keys::ONBOARDING_COMPLETE.to_string(), "yes".to_string()),
            ],
        )
        .await
        .unwrap();
        assert!(!ProfileRepository::is_complete(&conn).await.unwrap());

        ProfileRepository::set(&conn, keys::ONBOARDING_COMPLETE, "true")
            .await
            .unwrap();
        assert!(ProfileRepository::is_complete(&conn).await.unwrap());
    }
}
