// SPDX-FileCopyrightText: 2026 Chatplug Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant widget branding. The ledger reads `welcome_message` when
//! seeding a new session; everything else is dashboard-facing.

use chatplug_core::types::WidgetSettings;
use chatplug_core::ChatplugError;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::{map_tr_err, Database};

fn settings_from_row(row: &Row<'_>) -> rusqlite::Result<WidgetSettings> {
    Ok(WidgetSettings {
        tenant_id: row.get(0)?,
        business_name: row.get(1)?,
        primary_color: row.get(2)?,
        secondary_color: row.get(3)?,
        welcome_message: row.get(4)?,
        sales_representative: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Get a tenant's widget settings.
pub async fn widget_settings(
    db: &Database,
    tenant_id: &str,
) -> Result<Option<WidgetSettings>, ChatplugError> {
    let tenant_id = tenant_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn
                .query_row(
                    "SELECT tenant_id, business_name, primary_color, secondary_color,
                            welcome_message, sales_representative, created_at
                     FROM widget_settings WHERE tenant_id = ?1",
                    params![tenant_id],
                    settings_from_row,
                )
                .optional()?;
            Ok(result)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace a tenant's widget settings.
pub async fn upsert_widget_settings(
    db: &Database,
    settings: &WidgetSettings,
) -> Result<(), ChatplugError> {
    let settings = settings.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO widget_settings
                 (tenant_id, business_name, primary_color, secondary_color,
                  welcome_message, sales_representative, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(tenant_id) DO UPDATE SET
                     business_name = excluded.business_name,
                     primary_color = excluded.primary_color,
                     secondary_color = excluded.secondary_color,
                     welcome_message = excluded.welcome_message,
                     sales_representative = excluded.sales_representative",
                params![
                    settings.tenant_id,
                    settings.business_name,
                    settings.primary_color,
                    settings.secondary_color,
                    settings.welcome_message,
                    settings.sales_representative,
                    settings.created_at,
                ],
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

    #[tokio::test]
    async fn upsert_and_get_roundtrips() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        assert!(widget_settings(&db, "t1").await.unwrap().is_none());

        let settings = WidgetSettings {
            tenant_id: "t1".to_string(),
            business_name: "Acme Chairs".to_string(),
            primary_color: "#4f46e5".to_string(),
            secondary_color: "#ffffff".to_string(),
            welcome_message: "Welcome to Acme! Ask us anything.".to_string(),
            sales_representative: "Dana".to_string(),
            created_at: "2026-01-01T00:00:00.000000Z".to_string(),
        };
        upsert_widget_settings(&db, &settings).await.unwrap();

        let stored = widget_settings(&db, "t1").await.unwrap().unwrap();
        assert_eq!(stored.business_name, "Acme Chairs");
        assert_eq!(stored.welcome_message, "Welcome to Acme! Ask us anything.");

        let mut renamed = settings.clone();
        renamed.business_name = "Acme Seating".to_string();
        upsert_widget_settings(&db, &renamed).await.unwrap();
        let stored = widget_settings(&db, "t1").await.unwrap().unwrap();
        assert_eq!(stored.business_name, "Acme Seating");

        db.close().await.unwrap();
    }
}
