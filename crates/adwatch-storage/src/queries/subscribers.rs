// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscriber CRUD and flag-toggle operations.

use adwatch_core::AdwatchError;
use rusqlite::params;

use crate::database::Database;
use crate::models::Subscriber;

const SUBSCRIBER_COLUMNS: &str = "s.id, s.external_id, s.display_name, s.subscription_enabled,
     s.forwarding_enabled, s.menu_closed, s.created_at,
     (SELECT COUNT(*) FROM forward_queue fq WHERE fq.subscriber_id = s.id) AS queue_len";

/// Reads one subscriber row plus its keyword list. Sync helper shared by the
/// lookup queries; runs inside the writer thread.
fn fetch_subscriber(
    conn: &rusqlite::Connection,
    where_clause: &str,
    key: i64,
) -> Result<Option<Subscriber>, rusqlite::Error> {
    let sql = format!("SELECT {SUBSCRIBER_COLUMNS} FROM subscribers s WHERE {where_clause}");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row(params![key], |row| {
        Ok(Subscriber {
            id: row.get(0)?,
            external_id: row.get(1)?,
            display_name: row.get(2)?,
            subscription_enabled: row.get(3)?,
            forwarding_enabled: row.get(4)?,
            menu_closed: row.get(5)?,
            created_at: row.get(6)?,
            queue_len: row.get(7)?,
            keywords: Vec::new(),
        })
    });

    let mut subscriber = match row {
        Ok(s) => s,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut stmt = conn.prepare(
        "SELECT k.word FROM keywords k
         JOIN subscriber_keywords sk ON sk.keyword_id = k.id
         WHERE sk.subscriber_id = ?1 ORDER BY k.word",
    )?;
    let words = stmt.query_map(params![subscriber.id], |row| row.get(0))?;
    for word in words {
        subscriber.keywords.push(word?);
    }

    Ok(Some(subscriber))
}

/// Insert a new subscriber and return the stored row.
pub async fn create_subscriber(
    db: &Database,
    external_id: i64,
    display_name: Option<&str>,
) -> Result<Subscriber, AdwatchError> {
    let display_name = display_name.map(|n| n.to_string());
    let created_at = chrono::Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO subscribers (external_id, display_name, created_at)
                 VALUES (?1, ?2, ?3)",
                params![external_id, display_name, created_at],
            )?;
            let id = conn.last_insert_rowid();
            match fetch_subscriber(conn, "s.id = ?1", id)? {
                Some(subscriber) => Ok(subscriber),
                None => Err(rusqlite::Error::QueryReturnedNoRows),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a subscriber by internal id, keywords and queue length included.
pub async fn subscriber_by_id(db: &Database, id: i64) -> Result<Option<Subscriber>, AdwatchError> {
    db.connection()
        .call(move |conn| fetch_subscriber(conn, "s.id = ?1", id))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a subscriber by external platform id.
pub async fn subscriber_by_external_id(
    db: &Database,
    external_id: i64,
) -> Result<Option<Subscriber>, AdwatchError> {
    db.connection()
        .call(move |conn| fetch_subscriber(conn, "s.external_id = ?1", external_id))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Flip one boolean column; errors with `SubscriberNotFound` when the id has
/// no row.
async fn set_flag(
    db: &Database,
    id: i64,
    column: &'static str,
    value: bool,
) -> Result<(), AdwatchError> {
    let affected = db
        .connection()
        .call(move |conn| {
            let sql = format!("UPDATE subscribers SET {column} = ?1 WHERE id = ?2");
            conn.execute(&sql, params![value, id])
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    if affected == 0 {
        return Err(AdwatchError::SubscriberNotFound { subscriber_id: id });
    }
    Ok(())
}

pub async fn set_subscription_enabled(
    db: &Database,
    id: i64,
    enabled: bool,
) -> Result<(), AdwatchError> {
    set_flag(db, id, "subscription_enabled", enabled).await
}

pub async fn set_forwarding_enabled(
    db: &Database,
    id: i64,
    enabled: bool,
) -> Result<(), AdwatchError> {
    set_flag(db, id, "forwarding_enabled", enabled).await
}

pub async fn set_menu_closed(db: &Database, id: i64, closed: bool) -> Result<(), AdwatchError> {
    set_flag(db, id, "menu_closed", closed).await
}

/// Ids of subscribers whose persisted menu state is open; consumed once at
/// engine startup to rebuild the activity cache.
pub async fn open_menu_subscriber_ids(db: &Database) -> Result<Vec<i64>, AdwatchError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT id FROM subscribers WHERE menu_closed = 0 ORDER BY id")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            let mut ids = Vec::new();
            for row in rows {
                ids.push(row?);
            }
            Ok(ids)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn create_and_fetch_round_trip() {
        let (db, _dir) = setup_db().await;

        let created = create_subscriber(&db, 4242, Some("alice")).await.unwrap();
        assert_eq!(created.external_id, 4242);
        assert_eq!(created.display_name.as_deref(), Some("alice"));
        assert!(!created.subscription_enabled);
        assert!(!created.forwarding_enabled);
        assert!(created.menu_closed);
        assert_eq!(created.queue_len, 0);

        let by_id = subscriber_by_id(&db, created.id).await.unwrap().unwrap();
        assert_eq!(by_id, created);

        let by_ext = subscriber_by_external_id(&db, 4242).await.unwrap().unwrap();
        assert_eq!(by_ext.id, created.id);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn lookup_of_unknown_subscriber_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(subscriber_by_id(&db, 999).await.unwrap().is_none());
        assert!(subscriber_by_external_id(&db, 999).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn flag_toggles_persist() {
        let (db, _dir) = setup_db().await;
        let sub = create_subscriber(&db, 1, None).await.unwrap();

        set_subscription_enabled(&db, sub.id, true).await.unwrap();
        set_forwarding_enabled(&db, sub.id, true).await.unwrap();
        set_menu_closed(&db, sub.id, false).await.unwrap();

        let stored = subscriber_by_id(&db, sub.id).await.unwrap().unwrap();
        assert!(stored.subscription_enabled);
        assert!(stored.forwarding_enabled);
        assert!(!stored.menu_closed);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn toggling_unknown_subscriber_is_not_found() {
        let (db, _dir) = setup_db().await;
        let err = set_subscription_enabled(&db, 77, true).await.unwrap_err();
        assert!(matches!(
            err,
            AdwatchError::SubscriberNotFound { subscriber_id: 77 }
        ));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_menu_ids_reflect_persisted_flags() {
        let (db, _dir) = setup_db().await;
        let a = create_subscriber(&db, 1, None).await.unwrap();
        let b = create_subscriber(&db, 2, None).await.unwrap();
        let _c = create_subscriber(&db, 3, None).await.unwrap();

        set_menu_closed(&db, a.id, false).await.unwrap();
        set_menu_closed(&db, b.id, false).await.unwrap();

        let open = open_menu_subscriber_ids(&db).await.unwrap();
        assert_eq!(open, vec![a.id, b.id]);

        db.close().await.unwrap();
    }
}
