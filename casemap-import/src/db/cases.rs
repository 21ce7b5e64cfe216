//! Imported case persistence

use async_trait::async_trait;
use casemap_common::Result;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::models::MappedCase;
use crate::types::CaseStore;

/// `CaseStore` writing to the `cases` table
#[derive(Clone)]
pub struct SqliteCaseStore {
    db: SqlitePool,
}

impl SqliteCaseStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CaseStore for SqliteCaseStore {
    /// Insert every case inside one transaction
    async fn persist_batch(&self, cases: &[MappedCase]) -> Result<Vec<i64>> {
        if cases.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.db.begin().await?;
        let mut ids = Vec::with_capacity(cases.len());

        for case in cases {
            let (latitude, longitude, tier) = match &case.coordinate {
                Some(c) => (
                    Some(c.latitude.to_string()),
                    Some(c.longitude.to_string()),
                    Some(c.tier.as_str()),
                ),
                None => (None, None, None),
            };

            let result = sqlx::query(
                r#"
                INSERT INTO cases (
                    classification_id, workflow_state_id, year, age,
                    neighborhood, address, description, temporary_name, notes,
                    latitude, longitude, coordinate_tier,
                    source_row, imported_by, imported_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(case.classification_id)
            .bind(case.workflow_state_id)
            .bind(case.year)
            .bind(case.age)
            .bind(&case.neighborhood)
            .bind(&case.address)
            .bind(&case.description)
            .bind(&case.temporary_name)
            .bind(&case.notes)
            .bind(latitude)
            .bind(longitude)
            .bind(tier)
            .bind(case.row_number as i64)
            .bind(case.imported_by.to_string())
            .bind(case.imported_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;

            let id = result.last_insert_rowid();
            debug!(row = case.row_number, id, "Staged case insert");
            ids.push(id);
        }

        tx.commit().await?;
        info!("Persisted {} imported cases", ids.len());

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResolutionTier, ResolvedCoordinate};
    use bigdecimal::BigDecimal;
    use casemap_common::db::init_memory_database;
    use chrono::Utc;
    use std::str::FromStr;
    use uuid::Uuid;

    fn case(row_number: usize, coordinate: Option<ResolvedCoordinate>) -> MappedCase {
        MappedCase {
            row_number,
            classification_id: 1,
            workflow_state_id: 4,
            year: 2024,
            age: 30,
            neighborhood: "Centro".to_string(),
            address: "Centro".to_string(),
            description: "Imported case: Dengue grave".to_string(),
            temporary_name: format!("Imported case 2024-{}", row_number),
            notes: None,
            coordinate,
            imported_by: Uuid::new_v4(),
            imported_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_ids_returned_in_input_order() {
        let db = init_memory_database().await.unwrap();
        let store = SqliteCaseStore::new(db.clone());

        let ids = store
            .persist_batch(&[case(2, None), case(3, None), case(5, None)])
            .await
            .unwrap();

        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let rows: Vec<i64> = sqlx::query_scalar("SELECT source_row FROM cases ORDER BY id")
            .fetch_all(&db)
            .await
            .unwrap();
        assert_eq!(rows, vec![2, 3, 5]);
    }

    #[tokio::test]
    async fn test_coordinates_stored_as_exact_text() {
        let db = init_memory_database().await.unwrap();
        let store = SqliteCaseStore::new(db.clone());

        let coordinate = ResolvedCoordinate::new(
            BigDecimal::from_str("4.109694509").unwrap(),
            BigDecimal::from_str("-75.6821").unwrap(),
            ResolutionTier::Explicit,
        );
        store.persist_batch(&[case(2, Some(coordinate))]).await.unwrap();

        let (lat, lon, tier): (Option<String>, Option<String>, Option<String>) =
            sqlx::query_as("SELECT latitude, longitude, coordinate_tier FROM cases")
                .fetch_one(&db)
                .await
                .unwrap();
        assert_eq!(lat.as_deref(), Some("4.109694509"));
        assert_eq!(lon.as_deref(), Some("-75.6821"));
        assert_eq!(tier.as_deref(), Some("explicit"));
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let db = init_memory_database().await.unwrap();
        let store = SqliteCaseStore::new(db);
        assert!(store.persist_batch(&[]).await.unwrap().is_empty());
    }
}
