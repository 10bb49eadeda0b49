use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use tracing::debug;

use super::{Store, StoreError, StoreTx};
use crate::models::{Cat, Mission, NewCat, Status, Target, TargetDraft, TargetUpdate};

/// Persistence gateway backed by a SQLite pool.
///
/// Every unit of work opens with `BEGIN IMMEDIATE`, taking the write lock
/// before its first read. A check followed by a write in the same
/// [`SqliteTx`] therefore never runs on a stale snapshot, and concurrent
/// writers queue on the connection's busy timeout.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(Box::new(SqliteTx { tx: Some(tx) }))
    }
}

/// Open SQLite transaction; rolled back on drop unless committed
pub struct SqliteTx {
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteTx {
    fn conn(&mut self) -> Result<&mut Transaction<'static, Sqlite>, StoreError> {
        self.tx.as_mut().ok_or(StoreError::TransactionClosed)
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(table: &'static str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            table,
            reason: format!("bad timestamp '{raw}': {e}"),
        })
}

fn parse_status(table: &'static str, raw: &str) -> Result<Status, StoreError> {
    raw.parse()
        .map_err(|reason| StoreError::Corrupt { table, reason })
}

fn cat_from_row(row: &SqliteRow) -> Result<Cat, StoreError> {
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(Cat {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        years_of_experience: row.try_get("years_of_experience")?,
        breed: row.try_get("breed")?,
        salary: row.try_get("salary")?,
        created_at: parse_timestamp("cats", &created_at)?,
        updated_at: parse_timestamp("cats", &updated_at)?,
    })
}

fn mission_from_row(row: &SqliteRow) -> Result<Mission, StoreError> {
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(Mission {
        id: row.try_get("id")?,
        cat_id: row.try_get("cat_id")?,
        status: parse_status("missions", &status)?,
        targets: Vec::new(),
        created_at: parse_timestamp("missions", &created_at)?,
        updated_at: parse_timestamp("missions", &updated_at)?,
    })
}

fn target_from_row(row: &SqliteRow) -> Result<Target, StoreError> {
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(Target {
        id: row.try_get("id")?,
        mission_id: row.try_get("mission_id")?,
        name: row.try_get("name")?,
        country: row.try_get("country")?,
        notes: row.try_get("notes")?,
        status: parse_status("targets", &status)?,
        created_at: parse_timestamp("targets", &created_at)?,
        updated_at: parse_timestamp("targets", &updated_at)?,
    })
}

const CAT_COLUMNS: &str = "id, name, years_of_experience, breed, salary, created_at, updated_at";
const MISSION_COLUMNS: &str = "id, cat_id, status, created_at, updated_at";
const TARGET_COLUMNS: &str = "id, mission_id, name, country, notes, status, created_at, updated_at";

#[async_trait]
impl StoreTx for SqliteTx {
    async fn list_cats(&mut self) -> Result<Vec<Cat>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {CAT_COLUMNS} FROM cats ORDER BY id ASC"))
            .fetch_all(&mut **self.conn()?)
            .await?;
        rows.iter().map(cat_from_row).collect()
    }

    async fn get_cat(&mut self, id: i64) -> Result<Option<Cat>, StoreError> {
        let row = sqlx::query(&format!("SELECT {CAT_COLUMNS} FROM cats WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut **self.conn()?)
            .await?;
        row.as_ref().map(cat_from_row).transpose()
    }

    async fn insert_cat(&mut self, cat: &NewCat) -> Result<Cat, StoreError> {
        let now = timestamp(Utc::now());
        let result = sqlx::query(
            r#"
            INSERT INTO cats (name, years_of_experience, breed, salary, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(&cat.name)
        .bind(cat.years_of_experience)
        .bind(&cat.breed)
        .bind(cat.salary)
        .bind(&now)
        .execute(&mut **self.conn()?)
        .await?;

        let id = result.last_insert_rowid();
        debug!(cat_id = id, "inserted cat");
        self.get_cat(id).await?.ok_or(StoreError::Corrupt {
            table: "cats",
            reason: format!("row {id} vanished after insert"),
        })
    }

    async fn update_cat_salary(&mut self, id: i64, salary: f64) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE cats SET salary = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(salary)
            .bind(timestamp(Utc::now()))
            .bind(id)
            .execute(&mut **self.conn()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_cat(&mut self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cats WHERE id = ?1")
            .bind(id)
            .execute(&mut **self.conn()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn cat_exists(&mut self, id: i64) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cats WHERE id = ?1)")
            .bind(id)
            .fetch_one(&mut **self.conn()?)
            .await?;
        Ok(exists)
    }

    async fn cat_available(&mut self, id: i64) -> Result<bool, StoreError> {
        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM missions WHERE cat_id = ?1 AND status = 'in_progress'",
        )
        .bind(id)
        .fetch_one(&mut **self.conn()?)
        .await?;
        Ok(active == 0)
    }

    async fn insert_mission(
        &mut self,
        cat_id: Option<i64>,
        status: Status,
    ) -> Result<Mission, StoreError> {
        let now = timestamp(Utc::now());
        let result = sqlx::query(
            r#"
            INSERT INTO missions (cat_id, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            "#,
        )
        .bind(cat_id)
        .bind(status.as_str())
        .bind(&now)
        .execute(&mut **self.conn()?)
        .await?;

        let id = result.last_insert_rowid();
        debug!(mission_id = id, ?cat_id, "inserted mission");
        self.get_mission(id).await?.ok_or(StoreError::Corrupt {
            table: "missions",
            reason: format!("row {id} vanished after insert"),
        })
    }

    async fn list_missions(&mut self) -> Result<Vec<Mission>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {MISSION_COLUMNS} FROM missions ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&mut **self.conn()?)
        .await?;
        let mut missions = rows
            .iter()
            .map(mission_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let target_rows = sqlx::query(&format!(
            "SELECT {TARGET_COLUMNS} FROM targets ORDER BY mission_id ASC, id ASC"
        ))
        .fetch_all(&mut **self.conn()?)
        .await?;
        let mut by_mission: HashMap<i64, Vec<Target>> = HashMap::new();
        for row in &target_rows {
            let target = target_from_row(row)?;
            by_mission.entry(target.mission_id).or_default().push(target);
        }
        for mission in &mut missions {
            mission.targets = by_mission.remove(&mission.id).unwrap_or_default();
        }

        Ok(missions)
    }

    async fn get_mission(&mut self, id: i64) -> Result<Option<Mission>, StoreError> {
        let row = sqlx::query(&format!("SELECT {MISSION_COLUMNS} FROM missions WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut **self.conn()?)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut mission = mission_from_row(&row)?;

        let target_rows = sqlx::query(&format!(
            "SELECT {TARGET_COLUMNS} FROM targets WHERE mission_id = ?1 ORDER BY id ASC"
        ))
        .bind(id)
        .fetch_all(&mut **self.conn()?)
        .await?;
        mission.targets = target_rows
            .iter()
            .map(target_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(mission))
    }

    async fn update_mission(
        &mut self,
        id: i64,
        cat_id: Option<i64>,
        status: Status,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE missions SET cat_id = ?1, status = ?2, updated_at = ?3 WHERE id = ?4",
        )
        .bind(cat_id)
        .bind(status.as_str())
        .bind(timestamp(Utc::now()))
        .bind(id)
        .execute(&mut **self.conn()?)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn complete_mission(&mut self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE missions SET status = 'completed', updated_at = ?1 WHERE id = ?2",
        )
        .bind(timestamp(Utc::now()))
        .bind(id)
        .execute(&mut **self.conn()?)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn assign_cat(&mut self, mission_id: i64, cat_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE missions SET cat_id = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(cat_id)
            .bind(timestamp(Utc::now()))
            .bind(mission_id)
            .execute(&mut **self.conn()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_mission(&mut self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM missions WHERE id = ?1")
            .bind(id)
            .execute(&mut **self.conn()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mission_assigned(&mut self, id: i64) -> Result<bool, StoreError> {
        let cat_id: Option<Option<i64>> =
            sqlx::query_scalar("SELECT cat_id FROM missions WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut **self.conn()?)
                .await?;
        Ok(matches!(cat_id, Some(Some(_))))
    }

    async fn mission_completed(&mut self, id: i64) -> Result<bool, StoreError> {
        let status: Option<String> = sqlx::query_scalar("SELECT status FROM missions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut **self.conn()?)
            .await?;
        match status {
            Some(raw) => Ok(parse_status("missions", &raw)?.is_completed()),
            None => Ok(false),
        }
    }

    async fn insert_target(
        &mut self,
        mission_id: i64,
        draft: &TargetDraft,
        status: Status,
    ) -> Result<Target, StoreError> {
        let now = timestamp(Utc::now());
        let result = sqlx::query(
            r#"
            INSERT INTO targets (mission_id, name, country, notes, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(mission_id)
        .bind(&draft.name)
        .bind(&draft.country)
        .bind(&draft.notes)
        .bind(status.as_str())
        .bind(&now)
        .execute(&mut **self.conn()?)
        .await?;

        let id = result.last_insert_rowid();
        debug!(mission_id, target_id = id, "inserted target");
        self.get_target(id).await?.ok_or(StoreError::Corrupt {
            table: "targets",
            reason: format!("row {id} vanished after insert"),
        })
    }

    async fn get_target(&mut self, id: i64) -> Result<Option<Target>, StoreError> {
        let row = sqlx::query(&format!("SELECT {TARGET_COLUMNS} FROM targets WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut **self.conn()?)
            .await?;
        row.as_ref().map(target_from_row).transpose()
    }

    async fn count_targets(&mut self, mission_id: i64) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM targets WHERE mission_id = ?1")
            .bind(mission_id)
            .fetch_one(&mut **self.conn()?)
            .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn update_target(&mut self, target: &TargetUpdate) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE targets
            SET name = ?1, country = ?2, notes = ?3, status = ?4, updated_at = ?5
            WHERE id = ?6 AND mission_id = ?7
            "#,
        )
        .bind(&target.name)
        .bind(&target.country)
        .bind(&target.notes)
        .bind(target.status.as_str())
        .bind(timestamp(Utc::now()))
        .bind(target.id)
        .bind(target.mission_id)
        .execute(&mut **self.conn()?)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_target_notes(&mut self, id: i64, notes: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE targets SET notes = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(notes)
            .bind(timestamp(Utc::now()))
            .bind(id)
            .execute(&mut **self.conn()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn complete_target(
        &mut self,
        mission_id: i64,
        target_id: i64,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE targets
            SET status = 'completed', updated_at = ?1
            WHERE id = ?2 AND mission_id = ?3
            "#,
        )
        .bind(timestamp(Utc::now()))
        .bind(target_id)
        .bind(mission_id)
        .execute(&mut **self.conn()?)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_target(&mut self, mission_id: i64, target_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM targets WHERE id = ?1 AND mission_id = ?2")
            .bind(target_id)
            .bind(mission_id)
            .execute(&mut **self.conn()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn target_linked(&mut self, mission_id: i64, target_id: i64) -> Result<bool, StoreError> {
        let linked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM targets WHERE id = ?1 AND mission_id = ?2)",
        )
        .bind(target_id)
        .bind(mission_id)
        .fetch_one(&mut **self.conn()?)
        .await?;
        Ok(linked)
    }

    async fn target_completed(&mut self, id: i64) -> Result<bool, StoreError> {
        let status: Option<String> = sqlx::query_scalar("SELECT status FROM targets WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut **self.conn()?)
            .await?;
        match status {
            Some(raw) => Ok(parse_status("targets", &raw)?.is_completed()),
            None => Ok(false),
        }
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::TransactionClosed)?;
        tx.commit().await?;
        Ok(())
    }
}
