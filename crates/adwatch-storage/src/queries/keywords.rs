// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword linking and the active keyword index.
//!
//! Keywords are global and created lazily on first use; linking/unlinking
//! only touches the `subscriber_keywords` relation. Orphaned keyword rows are
//! harmless and never garbage-collected here.

use std::collections::HashMap;

use adwatch_core::AdwatchError;
use rusqlite::params;

use crate::database::Database;

/// Outcome of a link attempt, resolved inside one transaction.
enum LinkOutcome {
    Added,
    AlreadyPresent,
    CapReached,
    NoSubscriber,
}

/// Link `word` to the subscriber, creating the keyword row lazily.
///
/// Returns `Ok(false)` without error when the word is already linked or the
/// subscriber already holds `limit` keywords. The existence check, cap check,
/// and insert run in one transaction.
pub async fn add_keyword(
    db: &Database,
    subscriber_id: i64,
    word: &str,
    limit: usize,
) -> Result<bool, AdwatchError> {
    let word = word.to_string();
    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let exists: Option<i64> = tx
                .query_row(
                    "SELECT id FROM subscribers WHERE id = ?1",
                    params![subscriber_id],
                    |row| row.get(0),
                )
                .map(Some)
                .or_else(none_on_no_rows)?;
            if exists.is_none() {
                return Ok(LinkOutcome::NoSubscriber);
            }

            let linked: Option<i64> = tx
                .query_row(
                    "SELECT sk.keyword_id FROM subscriber_keywords sk
                     JOIN keywords k ON k.id = sk.keyword_id
                     WHERE sk.subscriber_id = ?1 AND k.word = ?2",
                    params![subscriber_id, word],
                    |row| row.get(0),
                )
                .map(Some)
                .or_else(none_on_no_rows)?;
            if linked.is_some() {
                return Ok(LinkOutcome::AlreadyPresent);
            }

            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM subscriber_keywords WHERE subscriber_id = ?1",
                params![subscriber_id],
                |row| row.get(0),
            )?;
            if count as usize >= limit {
                return Ok(LinkOutcome::CapReached);
            }

            let keyword_id: Option<i64> = tx
                .query_row(
                    "SELECT id FROM keywords WHERE word = ?1",
                    params![word],
                    |row| row.get(0),
                )
                .map(Some)
                .or_else(none_on_no_rows)?;
            let keyword_id = match keyword_id {
                Some(id) => id,
                None => {
                    tx.execute("INSERT INTO keywords (word) VALUES (?1)", params![word])?;
                    tx.last_insert_rowid()
                }
            };

            tx.execute(
                "INSERT INTO subscriber_keywords (subscriber_id, keyword_id) VALUES (?1, ?2)",
                params![subscriber_id, keyword_id],
            )?;
            tx.commit()?;
            Ok(LinkOutcome::Added)
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    match outcome {
        LinkOutcome::Added => Ok(true),
        LinkOutcome::AlreadyPresent | LinkOutcome::CapReached => Ok(false),
        LinkOutcome::NoSubscriber => Err(AdwatchError::SubscriberNotFound { subscriber_id }),
    }
}

/// Unlink `word` from the subscriber. Absence of the link is a no-op; an
/// unknown subscriber is an error.
pub async fn remove_keyword(
    db: &Database,
    subscriber_id: i64,
    word: &str,
) -> Result<(), AdwatchError> {
    let word = word.to_string();
    let found = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let exists: Option<i64> = tx
                .query_row(
                    "SELECT id FROM subscribers WHERE id = ?1",
                    params![subscriber_id],
                    |row| row.get(0),
                )
                .map(Some)
                .or_else(none_on_no_rows)?;
            if exists.is_none() {
                return Ok(false);
            }
            tx.execute(
                "DELETE FROM subscriber_keywords
                 WHERE subscriber_id = ?1
                   AND keyword_id IN (SELECT id FROM keywords WHERE word = ?2)",
                params![subscriber_id, word],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    if !found {
        return Err(AdwatchError::SubscriberNotFound { subscriber_id });
    }
    Ok(())
}

/// Keyword word -> ids of subscribers with `subscription_enabled == true`.
///
/// A full snapshot recomputed per matching pass; keywords linked only to
/// disabled subscribers are absent from the map.
pub async fn active_keyword_index(
    db: &Database,
) -> Result<HashMap<String, Vec<i64>>, AdwatchError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT k.word, sk.subscriber_id
                 FROM keywords k
                 JOIN subscriber_keywords sk ON sk.keyword_id = k.id
                 JOIN subscribers s ON s.id = sk.subscriber_id
                 WHERE s.subscription_enabled = 1
                 ORDER BY k.word, sk.subscriber_id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;

            let mut index: HashMap<String, Vec<i64>> = HashMap::new();
            for row in rows {
                let (word, subscriber_id) = row?;
                index.entry(word).or_default().push(subscriber_id);
            }
            Ok(index)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Collapse `QueryReturnedNoRows` into `None`, keeping other errors.
fn none_on_no_rows<T>(e: rusqlite::Error) -> Result<Option<T>, rusqlite::Error> {
    match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::subscribers::{create_subscriber, set_subscription_enabled};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn add_keyword_links_and_deduplicates() {
        let (db, _dir) = setup_db().await;
        let sub = create_subscriber(&db, 1, None).await.unwrap();

        assert!(add_keyword(&db, sub.id, "monitor", 10).await.unwrap());
        // Second add of the same word is a silent non-effect.
        assert!(!add_keyword(&db, sub.id, "monitor", 10).await.unwrap());

        let stored = crate::queries::subscribers::subscriber_by_id(&db, sub.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.keywords, vec!["monitor"]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn keyword_rows_are_shared_across_subscribers() {
        let (db, _dir) = setup_db().await;
        let a = create_subscriber(&db, 1, None).await.unwrap();
        let b = create_subscriber(&db, 2, None).await.unwrap();

        add_keyword(&db, a.id, "bicycle", 10).await.unwrap();
        add_keyword(&db, b.id, "bicycle", 10).await.unwrap();

        let count: i64 = db
            .connection()
            .call(|conn| {
                conn.query_row("SELECT COUNT(*) FROM keywords", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(count, 1, "one global keyword row, two links");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn cap_blocks_new_words_but_not_duplicates() {
        let (db, _dir) = setup_db().await;
        let sub = create_subscriber(&db, 1, None).await.unwrap();

        assert!(add_keyword(&db, sub.id, "one", 2).await.unwrap());
        assert!(add_keyword(&db, sub.id, "two", 2).await.unwrap());
        assert!(!add_keyword(&db, sub.id, "three", 2).await.unwrap());
        // An already-linked word reports non-effect, not cap.
        assert!(!add_keyword(&db, sub.id, "one", 2).await.unwrap());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn remove_keyword_unlinks_but_keeps_global_row() {
        let (db, _dir) = setup_db().await;
        let sub = create_subscriber(&db, 1, None).await.unwrap();
        add_keyword(&db, sub.id, "garage", 10).await.unwrap();

        remove_keyword(&db, sub.id, "garage").await.unwrap();
        // Removing again is an idempotent no-op.
        remove_keyword(&db, sub.id, "garage").await.unwrap();

        let stored = crate::queries::subscribers::subscriber_by_id(&db, sub.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.keywords.is_empty());

        let count: i64 = db
            .connection()
            .call(|conn| {
                conn.query_row("SELECT COUNT(*) FROM keywords", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(count, 1, "orphan keyword row is left behind");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn keyword_ops_on_unknown_subscriber_fail() {
        let (db, _dir) = setup_db().await;
        assert!(matches!(
            add_keyword(&db, 5, "x", 10).await.unwrap_err(),
            AdwatchError::SubscriberNotFound { subscriber_id: 5 }
        ));
        assert!(matches!(
            remove_keyword(&db, 5, "x").await.unwrap_err(),
            AdwatchError::SubscriberNotFound { subscriber_id: 5 }
        ));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn active_index_only_covers_enabled_subscribers() {
        let (db, _dir) = setup_db().await;
        let on = create_subscriber(&db, 1, None).await.unwrap();
        let off = create_subscriber(&db, 2, None).await.unwrap();

        add_keyword(&db, on.id, "bicycle", 10).await.unwrap();
        add_keyword(&db, on.id, "monitor", 10).await.unwrap();
        add_keyword(&db, off.id, "bicycle", 10).await.unwrap();

        set_subscription_enabled(&db, on.id, true).await.unwrap();

        let index = active_keyword_index(&db).await.unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index["bicycle"], vec![on.id]);
        assert_eq!(index["monitor"], vec![on.id]);

        db.close().await.unwrap();
    }
}
