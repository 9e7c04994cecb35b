// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingested message operations.

use adwatch_core::AdwatchError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{IngestedMessage, NewMessage};

/// Insert a message unless its dedup hash already exists.
///
/// Returns whether a new row was inserted; a duplicate submission is a
/// non-effect, not an error.
pub async fn insert_message(db: &Database, msg: &NewMessage) -> Result<bool, AdwatchError> {
    let msg = msg.clone();
    let inserted = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO messages
                     (source_id, category_id, text, url, hash, processed, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
                params![
                    msg.source_id,
                    msg.category_id,
                    msg.text,
                    msg.url,
                    msg.hash,
                    msg.created_at,
                ],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(inserted > 0)
}

/// All messages not yet run through the matching pass, oldest first.
pub async fn unprocessed_messages(db: &Database) -> Result<Vec<IngestedMessage>, AdwatchError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, source_id, category_id, text, url, hash, processed, created_at
                 FROM messages WHERE processed = 0 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(IngestedMessage {
                    id: row.get(0)?,
                    source_id: row.get(1)?,
                    category_id: row.get(2)?,
                    text: row.get(3)?,
                    url: row.get(4)?,
                    hash: row.get(5)?,
                    processed: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
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

    fn make_msg(text: &str, hash: &str) -> NewMessage {
        NewMessage {
            source_id: 100,
            category_id: 1,
            text: text.to_string(),
            url: format!("https://t.me/c/100/{hash}"),
            hash: hash.to_string(),
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_hash_inserts_exactly_one_row() {
        let (db, _dir) = setup_db().await;

        assert!(insert_message(&db, &make_msg("selling a monitor", "h1"))
            .await
            .unwrap());
        assert!(!insert_message(&db, &make_msg("selling a monitor", "h1"))
            .await
            .unwrap());

        let pending = unprocessed_messages(&db).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].text, "selling a monitor");
        assert!(!pending[0].processed);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unprocessed_messages_come_back_oldest_first() {
        let (db, _dir) = setup_db().await;

        insert_message(&db, &make_msg("first", "h1")).await.unwrap();
        insert_message(&db, &make_msg("second", "h2")).await.unwrap();
        insert_message(&db, &make_msg("third", "h3")).await.unwrap();

        let pending = unprocessed_messages(&db).await.unwrap();
        let texts: Vec<&str> = pending.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn empty_table_yields_no_unprocessed_messages() {
        let (db, _dir) = setup_db().await;
        assert!(unprocessed_messages(&db).await.unwrap().is_empty());
        db.close().await.unwrap();
    }
}
