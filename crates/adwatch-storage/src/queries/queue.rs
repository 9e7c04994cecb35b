// SPDX-FileCopyrightText: 2026 Adwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Forward-queue operations for the matching and drain passes.
//!
//! Queue rows carry only (subscriber_id, message_id); the implicit rowid
//! preserves FIFO enqueue order. Both the match commit and the post-drain
//! removal run as single transactions so a storage failure rolls back the
//! whole pass.

use adwatch_core::AdwatchError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{ForwardTarget, MatchPlanEntry, QueuedMessage};

/// Commit a whole matching pass: every queue insertion plus `processed = 1`
/// for every planned message, in one transaction.
///
/// `INSERT OR IGNORE` keeps re-queueing idempotent: a message already in a
/// subscriber's queue is not duplicated.
pub async fn commit_match_plan(
    db: &Database,
    plan: &[MatchPlanEntry],
) -> Result<(), AdwatchError> {
    if plan.is_empty() {
        return Ok(());
    }
    let plan = plan.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for entry in &plan {
                for subscriber_id in &entry.subscriber_ids {
                    tx.execute(
                        "INSERT OR IGNORE INTO forward_queue (subscriber_id, message_id)
                         VALUES (?1, ?2)",
                        params![subscriber_id, entry.message_id],
                    )?;
                }
                tx.execute(
                    "UPDATE messages SET processed = 1 WHERE id = ?1",
                    params![entry.message_id],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Subscribers whose queues are eligible for draining.
pub async fn forwarding_targets(db: &Database) -> Result<Vec<ForwardTarget>, AdwatchError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, external_id FROM subscribers
                 WHERE forwarding_enabled = 1 ORDER BY id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(ForwardTarget {
                    id: row.get(0)?,
                    external_id: row.get(1)?,
                })
            })?;
            let mut targets = Vec::new();
            for row in rows {
                targets.push(row?);
            }
            Ok(targets)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// FIFO snapshot of one subscriber's queue. The live queue is never mutated
/// during iteration; the drain pass walks this snapshot instead.
pub async fn queued_messages(
    db: &Database,
    subscriber_id: i64,
) -> Result<Vec<QueuedMessage>, AdwatchError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT fq.message_id, m.url, m.text
                 FROM forward_queue fq
                 JOIN messages m ON m.id = fq.message_id
                 WHERE fq.subscriber_id = ?1
                 ORDER BY fq.rowid ASC",
            )?;
            let rows = stmt.query_map(params![subscriber_id], |row| {
                Ok(QueuedMessage {
                    message_id: row.get(0)?,
                    url: row.get(1)?,
                    text: row.get(2)?,
                })
            })?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row?);
            }
            Ok(entries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Remove delivered entries in one transaction.
pub async fn remove_queued(
    db: &Database,
    subscriber_id: i64,
    message_ids: &[i64],
) -> Result<(), AdwatchError> {
    if message_ids.is_empty() {
        return Ok(());
    }
    let message_ids = message_ids.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for message_id in &message_ids {
                tx.execute(
                    "DELETE FROM forward_queue WHERE subscriber_id = ?1 AND message_id = ?2",
                    params![subscriber_id, message_id],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewMessage;
    use crate::queries::messages::{insert_message, unprocessed_messages};
    use crate::queries::subscribers::{create_subscriber, set_forwarding_enabled};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    async fn ingest(db: &Database, text: &str, hash: &str) -> i64 {
        insert_message(
            db,
            &NewMessage {
                source_id: 1,
                category_id: 0,
                text: text.to_string(),
                url: format!("https://t.me/c/1/{hash}"),
                hash: hash.to_string(),
                created_at: "2026-01-01T00:00:00+00:00".to_string(),
            },
        )
        .await
        .unwrap();
        unprocessed_messages(db)
            .await
            .unwrap()
            .iter()
            .find(|m| m.hash == hash)
            .map(|m| m.id)
            .unwrap()
    }

    #[tokio::test]
    async fn commit_match_plan_queues_and_flags_atomically() {
        let (db, _dir) = setup_db().await;
        let sub = create_subscriber(&db, 1, None).await.unwrap();
        let msg_id = ingest(&db, "selling a monitor", "h1").await;

        commit_match_plan(
            &db,
            &[MatchPlanEntry {
                message_id: msg_id,
                subscriber_ids: vec![sub.id],
            }],
        )
        .await
        .unwrap();

        assert!(unprocessed_messages(&db).await.unwrap().is_empty());
        let queued = queued_messages(&db, sub.id).await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].message_id, msg_id);
        assert_eq!(queued[0].text, "selling a monitor");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn requeueing_the_same_pair_is_idempotent() {
        let (db, _dir) = setup_db().await;
        let sub = create_subscriber(&db, 1, None).await.unwrap();
        let msg_id = ingest(&db, "text", "h1").await;

        let plan = [MatchPlanEntry {
            message_id: msg_id,
            subscriber_ids: vec![sub.id, sub.id],
        }];
        commit_match_plan(&db, &plan).await.unwrap();
        commit_match_plan(&db, &plan).await.unwrap();

        assert_eq!(queued_messages(&db, sub.id).await.unwrap().len(), 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn queue_snapshot_preserves_enqueue_order() {
        let (db, _dir) = setup_db().await;
        let sub = create_subscriber(&db, 1, None).await.unwrap();
        let first = ingest(&db, "first", "h1").await;
        let second = ingest(&db, "second", "h2").await;

        commit_match_plan(
            &db,
            &[
                MatchPlanEntry {
                    message_id: first,
                    subscriber_ids: vec![sub.id],
                },
                MatchPlanEntry {
                    message_id: second,
                    subscriber_ids: vec![sub.id],
                },
            ],
        )
        .await
        .unwrap();

        let queued = queued_messages(&db, sub.id).await.unwrap();
        assert_eq!(queued[0].message_id, first);
        assert_eq!(queued[1].message_id, second);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn remove_queued_deletes_only_named_entries() {
        let (db, _dir) = setup_db().await;
        let sub = create_subscriber(&db, 1, None).await.unwrap();
        let first = ingest(&db, "first", "h1").await;
        let second = ingest(&db, "second", "h2").await;

        commit_match_plan(
            &db,
            &[
                MatchPlanEntry {
                    message_id: first,
                    subscriber_ids: vec![sub.id],
                },
                MatchPlanEntry {
                    message_id: second,
                    subscriber_ids: vec![sub.id],
                },
            ],
        )
        .await
        .unwrap();

        remove_queued(&db, sub.id, &[first]).await.unwrap();

        let queued = queued_messages(&db, sub.id).await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].message_id, second);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn forwarding_targets_filter_on_flag() {
        let (db, _dir) = setup_db().await;
        let on = create_subscriber(&db, 10, None).await.unwrap();
        let _off = create_subscriber(&db, 20, None).await.unwrap();
        set_forwarding_enabled(&db, on.id, true).await.unwrap();

        let targets = forwarding_targets(&db).await.unwrap();
        assert_eq!(
            targets,
            vec![ForwardTarget {
                id: on.id,
                external_id: 10
            }]
        );

        db.close().await.unwrap();
    }
}
