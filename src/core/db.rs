//! Local credential store. Only refresh tokens live here, one row per
//! connected account.
use anyhow::Result;
use rusqlite::Connection as SyncConnection;
use tokio_rusqlite::Connection;

pub async fn async_db(db_path: &str) -> Result<Connection> {
    let path = format!("{}/assistant.sqlite", db_path.trim_end_matches('/'));
    let conn = Connection::open(path).await?;
    Ok(conn)
}

pub fn initialize_db(conn: &SyncConnection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS auth (
             id TEXT PRIMARY KEY,
             service TEXT NOT NULL,
             refresh_token TEXT NOT NULL
         );",
    )?;
    Ok(())
}

pub async fn save_refresh_token(
    db: &Connection,
    account: &str,
    service: &str,
    refresh_token: &str,
) -> Result<()> {
    let account = account.to_string();
    let service = service.to_string();
    let refresh_token = refresh_token.to_string();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO auth (id, service, refresh_token) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET service = excluded.service, refresh_token = excluded.refresh_token",
            (&account, &service, &refresh_token),
        )?;
        Ok(())
    })
    .await?;
    Ok(())
}

/// Returns `None` when the account was never connected.
pub async fn find_refresh_token(db: &Connection, account: &str) -> Result<Option<String>> {
    let account = account.to_string();
    let token = db
        .call(move |conn| {
            let mut stmt = conn.prepare("SELECT refresh_token FROM auth WHERE id = ?1")?;
            let mut rows = stmt.query([&account])?;
            match rows.next()? {
                Some(row) => Ok(Some(row.get(0)?)),
                None => Ok(None),
            }
        })
        .await?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_find_refresh_token() {
        let dir = tempfile::tempdir().unwrap();
        let db = async_db(dir.path().to_str().unwrap()).await.unwrap();
        db.call(|conn| {
            initialize_db(conn).expect("Failed to migrate db");
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(find_refresh_token(&db, "me@example.com").await.unwrap(), None);

        save_refresh_token(&db, "me@example.com", "google", "rt-1").await.unwrap();
        save_refresh_token(&db, "me@example.com", "google", "rt-2").await.unwrap();

        assert_eq!(
            find_refresh_token(&db, "me@example.com").await.unwrap(),
            Some("rt-2".to_string())
        );
    }
}
