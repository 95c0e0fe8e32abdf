use super::WarehouseStore;
use crate::{error::GenResult, types::AccountId};
use rusqlite::params;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub run_id:      String,
    pub seed:        u64,
    pub version:     String,
    pub config_json: String,
    pub started_at:  String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRow {
    pub user_id:           AccountId,
    pub month:             String,
    pub phone_total_calls: u64,
    pub total_minutes:     f64,
}

impl WarehouseStore {
    // ── Read-back ──────────────────────────────────────────────

    pub fn attribute_row_count(&self, run_id: &str) -> GenResult<u64> {
        self.count("SELECT COUNT(*) FROM account_attributes_monthly WHERE run_id = ?1", run_id)
    }

    pub fn usage_row_count(&self, run_id: &str) -> GenResult<u64> {
        self.count("SELECT COUNT(*) FROM phone_usage_data WHERE run_id = ?1", run_id)
    }

    pub fn churn_row_count(&self, run_id: &str) -> GenResult<u64> {
        self.count("SELECT COUNT(*) FROM churn_records WHERE run_id = ?1", run_id)
    }

    pub fn churned_count(&self, run_id: &str) -> GenResult<u64> {
        self.count("SELECT COUNT(*) FROM churn_records WHERE run_id = ?1 AND churned = 1", run_id)
    }

    fn count(&self, sql: &str, run_id: &str) -> GenResult<u64> {
        let n: i64 = self.conn.query_row(sql, params![run_id], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Usage rows of one account, oldest month first.
    pub fn usage_for_user(&self, run_id: &str, user_id: AccountId) -> GenResult<Vec<UsageRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT userid, month, phone_total_calls, phone_total_minutes_of_use
             FROM phone_usage_data WHERE run_id = ?1 AND userid = ?2
             ORDER BY month ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id, user_id as i64], |row| {
                Ok(UsageRow {
                    user_id:           row.get::<_, i64>(0)? as u64,
                    month:             row.get(1)?,
                    phone_total_calls: row.get::<_, i64>(2)? as u64,
                    total_minutes:     row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// SA_ACCT_STATUS of one account in one month (`YYYY-MM-01`).
    pub fn status_in_month(&self, run_id: &str, user_id: AccountId, month: &str) -> GenResult<Option<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT sa_acct_status FROM account_attributes_monthly
             WHERE run_id = ?1 AND service_account_id = ?2 AND month = ?3",
        )?;
        let mut rows = stmt.query(params![run_id, user_id as i64, month])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }
}
