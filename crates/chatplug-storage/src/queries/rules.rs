// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply rule operations for the `advanced_replies` and `auto_replies`
//! tables.
//!
//! The two tables share a shape except that only advanced rules carry
//! `is_url`. Keywords are stored as a JSON array so their insertion order
//! (the evaluation order) survives the round trip. Rule invariants are
//! enforced here at write time; the matcher never re-validates.

use std::str::FromStr;

use chatplug_core::types::{MatchingType, ReplyRule};
use chatplug_core::ChatplugError;
use rusqlite::{params, Row};

use crate::database::{map_tr_err, Database};

/// Which rule table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Advanced,
    Basic,
}

impl RuleKind {
    fn table(self) -> &'static str {
        match self {
            RuleKind::Advanced => "advanced_replies",
            RuleKind::Basic => "auto_replies",
        }
    }
}

fn encode_keywords(rule: &ReplyRule) -> Result<String, rusqlite::Error> {
    serde_json::to_string(&rule.keywords)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn advanced_from_row(row: &Row<'_>) -> rusqlite::Result<ReplyRule> {
    rule_from_row(row, true)
}

fn basic_from_row(row: &Row<'_>) -> rusqlite::Result<ReplyRule> {
    rule_from_row(row, false)
}

fn rule_from_row(row: &Row<'_>, with_url: bool) -> rusqlite::Result<ReplyRule> {
    let keywords_json: String = row.get(2)?;
    let keywords: Vec<String> = serde_json::from_str(&keywords_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let matching: String = row.get(3)?;
    let matching_type = MatchingType::from_str(&matching).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(ReplyRule {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        keywords,
        matching_type,
        response: row.get(4)?,
        is_url: if with_url { row.get(5)? } else { false },
        created_at: row.get(if with_url { 6 } else { 5 })?,
    })
}

/// List a tenant's rules in evaluation order (most recently created first).
pub async fn list_rules(
    db: &Database,
    kind: RuleKind,
    tenant_id: &str,
) -> Result<Vec<ReplyRule>, ChatplugError> {
    let tenant_id = tenant_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut rules = Vec::new();
            match kind {
                RuleKind::Advanced => {
                    let mut stmt = conn.prepare(
                        "SELECT id, tenant_id, keywords, matching_type, response, is_url, created_at
                         FROM advanced_replies WHERE tenant_id = ?1
                         ORDER BY created_at DESC",
                    )?;
                    let rows = stmt.query_map(params![tenant_id], advanced_from_row)?;
                    for row in rows {
                        rules.push(row?);
                    }
                }
                RuleKind::Basic => {
                    let mut stmt = conn.prepare(
                        "SELECT id, tenant_id, keywords, matching_type, response, created_at
                         FROM auto_replies WHERE tenant_id = ?1
                         ORDER BY created_at DESC",
                    )?;
                    let rows = stmt.query_map(params![tenant_id], basic_from_row)?;
                    for row in rows {
                        rules.push(row?);
                    }
                }
            }
            Ok(rules)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a rule after checking its write-time invariants.
pub async fn insert_rule(
    db: &Database,
    kind: RuleKind,
    rule: &ReplyRule,
) -> Result<(), ChatplugError> {
    rule.validate()?;
    let rule = rule.clone();
    db.connection()
        .call(move |conn| {
            let keywords = encode_keywords(&rule)?;
            match kind {
                RuleKind::Advanced => {
                    conn.execute(
                        "INSERT INTO advanced_replies
                         (id, tenant_id, keywords, matching_type, response, is_url, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![
                            rule.id,
                            rule.tenant_id,
                            keywords,
                            rule.matching_type.to_string(),
                            rule.response,
                            rule.is_url,
                            rule.created_at,
                        ],
                    )?;
                }
                RuleKind::Basic => {
                    conn.execute(
                        "INSERT INTO auto_replies
                         (id, tenant_id, keywords, matching_type, response, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![
                            rule.id,
                            rule.tenant_id,
                            keywords,
                            rule.matching_type.to_string(),
                            rule.response,
                            rule.created_at,
                        ],
                    )?;
                }
            }
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Update a rule in place (same write-time invariants as insert).
pub async fn update_rule(
    db: &Database,
    kind: RuleKind,
    rule: &ReplyRule,
) -> Result<(), ChatplugError> {
    rule.validate()?;
    let rule = rule.clone();
    db.connection()
        .call(move |conn| {
            let keywords = encode_keywords(&rule)?;
            match kind {
                RuleKind::Advanced => {
                    conn.execute(
                        "UPDATE advanced_replies
                         SET keywords = ?1, matching_type = ?2, response = ?3, is_url = ?4
                         WHERE id = ?5 AND tenant_id = ?6",
                        params![
                            keywords,
                            rule.matching_type.to_string(),
                            rule.response,
                            rule.is_url,
                            rule.id,
                            rule.tenant_id,
                        ],
                    )?;
                }
                RuleKind::Basic => {
                    conn.execute(
                        "UPDATE auto_replies
                         SET keywords = ?1, matching_type = ?2, response = ?3
                         WHERE id = ?4 AND tenant_id = ?5",
                        params![
                            keywords,
                            rule.matching_type.to_string(),
                            rule.response,
                            rule.id,
                            rule.tenant_id,
                        ],
                    )?;
                }
            }
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a rule by id, scoped to its tenant.
pub async fn delete_rule(
    db: &Database,
    kind: RuleKind,
    tenant_id: &str,
    id: &str,
) -> Result<(), ChatplugError> {
    let tenant_id = tenant_id.to_string();
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                &format!(
                    "DELETE FROM {} WHERE id = ?1 AND tenant_id = ?2",
                    kind.table()
                ),
                params![id, tenant_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
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

    fn rule(id: &str, keywords: Vec<&str>, created_at: &str) -> ReplyRule {
        ReplyRule {
            id: id.to_string(),
            tenant_id: "t1".to_string(),
            keywords: keywords.into_iter().map(String::from).collect(),
            matching_type: MatchingType::Word,
            response: "See https://example.com/pricing".to_string(),
            is_url: true,
            created_at: created_at.to_string(),
        }
    }

    #[tokio::test]
    async fn keywords_round_trip_in_order() {
        let (db, _dir) = setup_db().await;
        let original = rule(
            "r1",
            vec!["pricing", "price", "cost"],
            "2026-01-01T00:00:00.000000Z",
        );
        insert_rule(&db, RuleKind::Advanced, &original).await.unwrap();

        let rules = list_rules(&db, RuleKind::Advanced, "t1").await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].keywords, vec!["pricing", "price", "cost"]);
        assert_eq!(rules[0].matching_type, MatchingType::Word);
        assert!(rules[0].is_url);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn basic_rules_never_report_is_url() {
        let (db, _dir) = setup_db().await;
        let mut r = rule("r1", vec!["hours"], "2026-01-01T00:00:00.000000Z");
        r.is_url = true; // ignored for the basic table
        insert_rule(&db, RuleKind::Basic, &r).await.unwrap();

        let rules = list_rules(&db, RuleKind::Basic, "t1").await.unwrap();
        assert!(!rules[0].is_url);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_orders_most_recent_first() {
        let (db, _dir) = setup_db().await;
        insert_rule(
            &db,
            RuleKind::Basic,
            &rule("old", vec!["hours"], "2026-01-01T00:00:00.000000Z"),
        )
        .await
        .unwrap();
        insert_rule(
            &db,
            RuleKind::Basic,
            &rule("new", vec!["shipping"], "2026-02-01T00:00:00.000000Z"),
        )
        .await
        .unwrap();

        let rules = list_rules(&db, RuleKind::Basic, "t1").await.unwrap();
        assert_eq!(rules[0].id, "new");
        assert_eq!(rules[1].id, "old");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_rules_are_rejected_at_write_time() {
        let (db, _dir) = setup_db().await;

        let no_keywords = rule("r1", vec![], "2026-01-01T00:00:00.000000Z");
        let err = insert_rule(&db, RuleKind::Basic, &no_keywords).await.unwrap_err();
        assert!(matches!(err, ChatplugError::InvalidRule { .. }));

        let mut blank_response = rule("r2", vec!["hi"], "2026-01-01T00:00:00.000000Z");
        blank_response.response = "  ".to_string();
        let err = update_rule(&db, RuleKind::Advanced, &blank_response)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatplugError::InvalidRule { .. }));

        assert!(list_rules(&db, RuleKind::Basic, "t1").await.unwrap().is_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_and_delete_scoped_to_tenant() {
        let (db, _dir) = setup_db().await;
        let original = rule("r1", vec!["refund"], "2026-01-01T00:00:00.000000Z");
        insert_rule(&db, RuleKind::Advanced, &original).await.unwrap();

        let mut changed = original.clone();
        changed.response = "Our refund policy changed".to_string();
        changed.is_url = false;
        update_rule(&db, RuleKind::Advanced, &changed).await.unwrap();

        let rules = list_rules(&db, RuleKind::Advanced, "t1").await.unwrap();
        assert_eq!(rules[0].response, "Our refund policy changed");
        assert!(!rules[0].is_url);

        // A delete under the wrong tenant is a no-op.
        delete_rule(&db, RuleKind::Advanced, "other", "r1").await.unwrap();
        assert_eq!(list_rules(&db, RuleKind::Advanced, "t1").await.unwrap().len(), 1);

        delete_rule(&db, RuleKind::Advanced, "t1", "r1").await.unwrap();
        assert!(list_rules(&db, RuleKind::Advanced, "t1").await.unwrap().is_empty());
        db.close().await.unwrap();
    }
}
