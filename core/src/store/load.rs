use super::{now, WarehouseStore};
use crate::{
    error::GenResult,
    export::attribute_fields,
    generator::Dataset,
    metrics::{Metric, MetricValue},
};
use rusqlite::{params, params_from_iter, types::Value, Transaction};

const DATA_TABLES: [&str; 3] = ["account_attributes_monthly", "phone_usage_data", "churn_records"];

impl WarehouseStore {
    // ── Load ───────────────────────────────────────────────────

    /// Load all three tables for `run_id` in one transaction.
    /// Any rows already stored for the run are replaced.
    pub fn load_dataset(&mut self, run_id: &str, dataset: &Dataset) -> GenResult<()> {
        let loaded_at = now();
        let tx = self.conn.transaction()?;
        clear_run_tables(&tx, run_id)?;
        insert_attributes(&tx, run_id, dataset, &loaded_at)?;
        insert_usage(&tx, run_id, dataset, &loaded_at)?;
        insert_churn(&tx, run_id, dataset, &loaded_at)?;
        tx.commit()?;
        log::info!(
            "store: loaded run {run_id}: {} attribute rows, {} usage rows, {} churn rows",
            dataset.attributes.len(),
            dataset.usage.len(),
            dataset.churn.len()
        );
        Ok(())
    }

    /// Delete every data row of `run_id`. The run row itself is kept.
    pub fn clear_run(&mut self, run_id: &str) -> GenResult<()> {
        let tx = self.conn.transaction()?;
        clear_run_tables(&tx, run_id)?;
        tx.commit()?;
        log::debug!("store: cleared run {run_id}");
        Ok(())
    }
}

fn clear_run_tables(tx: &Transaction<'_>, run_id: &str) -> GenResult<()> {
    for table in DATA_TABLES {
        tx.execute(&format!("DELETE FROM {table} WHERE run_id = ?1"), params![run_id])?;
    }
    Ok(())
}

fn insert_attributes(tx: &Transaction<'_>, run_id: &str, dataset: &Dataset, loaded_at: &str) -> GenResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO account_attributes_monthly (
            run_id, month, enterprise_account_id, company, ea_brand_id, ea_brand_name,
            ea_ubrand_id, ea_ubrand_description, ea_acct_status, service_account_id,
            sa_brand_id, sa_brand_name, sa_ubrand_id, sa_ubrand_description, sa_acct_status,
            package_id, package_name, catalog_package_id, catalog_package_name, is_tester,
            tier_id, tier_name, edition_name, external_account_id, ban, opco_id, loaded_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                  ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27)",
    )?;
    for record in &dataset.attributes {
        let fields = attribute_fields(record);
        let values = std::iter::once(run_id.to_string())
            .chain(fields)
            .chain(std::iter::once(loaded_at.to_string()));
        stmt.execute(params_from_iter(values))?;
    }
    Ok(())
}

fn insert_usage(tx: &Transaction<'_>, run_id: &str, dataset: &Dataset, loaded_at: &str) -> GenResult<()> {
    let metric_columns: Vec<String> = Metric::ALL.iter().map(|m| m.column().to_lowercase()).collect();
    let placeholders: Vec<String> = (1..=metric_columns.len() + 4).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO phone_usage_data (run_id, userid, month, {}, loaded_at) VALUES ({})",
        metric_columns.join(", "),
        placeholders.join(", ")
    );
    let mut stmt = tx.prepare(&sql)?;

    for row in &dataset.usage {
        let mut values: Vec<Value> = Vec::with_capacity(metric_columns.len() + 4);
        values.push(Value::Text(run_id.to_string()));
        values.push(Value::Integer(row.user_id as i64));
        values.push(Value::Text(row.month.to_string()));
        for metric in Metric::ALL {
            values.push(match row.metrics.get(metric) {
                Some(MetricValue::Count(n)) => Value::Integer(n as i64),
                Some(MetricValue::Minutes(m)) => Value::Real(m),
                None => Value::Integer(0),
            });
        }
        values.push(Value::Text(loaded_at.to_string()));
        stmt.execute(params_from_iter(values))?;
    }
    Ok(())
}

fn insert_churn(tx: &Transaction<'_>, run_id: &str, dataset: &Dataset, loaded_at: &str) -> GenResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO churn_records (run_id, userid, churn_date, churned, loaded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for record in &dataset.churn {
        stmt.execute(params![
            run_id,
            record.user_id as i64,
            record.churn_date.map(|d| d.to_string()),
            record.churned,
            loaded_at,
        ])?;
    }
    Ok(())
}
