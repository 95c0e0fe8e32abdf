//! CSV export of the three generated tables.
//!
//! Files land in `dir` as
//!   account_attributes_monthly.csv, phone_usage_data.csv, churn_records.csv
//! with upper-case headers. Rows keep generation order (account, then month).

use crate::{
    error::GenResult,
    generator::{AttributeRecord, Dataset},
    metrics::Metric,
};
use std::path::{Path, PathBuf};

pub const ATTRIBUTES_FILE: &str = "account_attributes_monthly.csv";
pub const USAGE_FILE: &str = "phone_usage_data.csv";
pub const CHURN_FILE: &str = "churn_records.csv";

pub const ATTRIBUTE_COLUMNS: [&str; 25] = [
    "MONTH", "ENTERPRISE_ACCOUNT_ID", "COMPANY", "EA_BRAND_ID", "EA_BRAND_NAME",
    "EA_UBRAND_ID", "EA_UBRAND_DESCRIPTION", "EA_ACCT_STATUS", "SERVICE_ACCOUNT_ID",
    "SA_BRAND_ID", "SA_BRAND_NAME", "SA_UBRAND_ID", "SA_UBRAND_DESCRIPTION", "SA_ACCT_STATUS",
    "PACKAGE_ID", "PACKAGE_NAME", "CATALOG_PACKAGE_ID", "CATALOG_PACKAGE_NAME", "IS_TESTER",
    "TIER_ID", "TIER_NAME", "EDITION_NAME", "EXTERNAL_ACCOUNT_ID", "BAN", "OPCO_ID",
];

pub const CHURN_COLUMNS: [&str; 3] = ["USERID", "CHURN_DATE", "CHURNED"];

#[derive(Debug, Clone)]
pub struct ExportedFiles {
    pub attributes: PathBuf,
    pub usage:      PathBuf,
    pub churn:      PathBuf,
}

/// Write all three tables into `dir`, creating it if needed.
pub fn write_csv(dir: &Path, dataset: &Dataset) -> GenResult<ExportedFiles> {
    std::fs::create_dir_all(dir)?;
    let files = ExportedFiles {
        attributes: dir.join(ATTRIBUTES_FILE),
        usage:      dir.join(USAGE_FILE),
        churn:      dir.join(CHURN_FILE),
    };

    write_attributes(&files.attributes, dataset)?;
    write_usage(&files.usage, dataset)?;
    write_churn(&files.churn, dataset)?;

    log::info!(
        "export: wrote {} attribute rows, {} usage rows, {} churn rows to {}",
        dataset.attributes.len(),
        dataset.usage.len(),
        dataset.churn.len(),
        dir.display()
    );
    Ok(files)
}

fn write_attributes(path: &Path, dataset: &Dataset) -> GenResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(ATTRIBUTE_COLUMNS)?;
    for record in &dataset.attributes {
        writer.write_record(attribute_fields(record))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn attribute_fields(record: &AttributeRecord) -> [String; 25] {
    let a = &record.attributes;
    let status = record.status.as_str().to_string();
    [
        record.month.to_string(),
        a.enterprise_account_id.to_string(),
        a.company_name.clone(),
        a.enterprise_brand.id.to_string(),
        a.enterprise_brand.name.clone(),
        a.enterprise_ubrand.id.clone(),
        a.enterprise_ubrand.description.clone(),
        status.clone(),
        a.service_account_id.to_string(),
        a.service_brand.id.to_string(),
        a.service_brand.name.clone(),
        a.service_ubrand.id.clone(),
        a.service_ubrand.description.clone(),
        status,
        record.package.id.to_string(),
        record.package.name.clone(),
        record.package.catalog_id.clone(),
        record.package.catalog_name.clone(),
        u8::from(a.is_tester).to_string(),
        a.tier.id.to_string(),
        a.tier.name.clone(),
        a.tier.edition.clone(),
        a.external_account_id.clone(),
        a.billing_account_number.clone(),
        a.opco.clone(),
    ]
}

fn write_usage(path: &Path, dataset: &Dataset) -> GenResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let header = ["USERID", "MONTH"]
        .into_iter()
        .chain(Metric::ALL.iter().map(|m| m.column()));
    writer.write_record(header)?;
    for row in &dataset.usage {
        let mut fields = Vec::with_capacity(2 + Metric::ALL.len());
        fields.push(row.user_id.to_string());
        fields.push(row.month.to_string());
        for metric in Metric::ALL {
            fields.push(row.metrics.get(metric).map(|v| v.to_string()).unwrap_or_default());
        }
        writer.write_record(&fields)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_churn(path: &Path, dataset: &Dataset) -> GenResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CHURN_COLUMNS)?;
    for record in &dataset.churn {
        writer.write_record([
            record.user_id.to_string(),
            record.churn_date.map(|d| d.to_string()).unwrap_or_default(),
            u8::from(record.churned).to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
