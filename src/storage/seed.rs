use chrono::{Duration, Local, NaiveDate};
use rusqlite::Connection;

use super::repository::{self, BugRecord, WorkItemRecord};
use crate::date_util::date_key;

/// Populate the warehouse with the sample dataset: two projects, a handful
/// of work items, and bugs spread over the two weeks before `today`.
/// Re-running is safe; rows are upserted by id.
pub fn seed_demo_data(conn: &Connection) -> Result<(), rusqlite::Error> {
    let today = Local::now().date_naive();
    seed_demo_data_at(conn, today)
}

/// Same as [`seed_demo_data`] but with an explicit anchor date, so tests can
/// pin the dataset to a known day.
pub fn seed_demo_data_at(conn: &Connection, today: NaiveDate) -> Result<(), rusqlite::Error> {
    repository::upsert_project(
        conn,
        1,
        "HotRetailSys",
        Some("Retail storefront and checkout"),
        true,
    )?;
    repository::upsert_project(
        conn,
        2,
        "PaymentsGateway",
        Some("Card processing gateway"),
        true,
    )?;

    let work_items = [
        (10, 1, "Checkout flow"),
        (11, 1, "Inventory sync"),
        (20, 2, "Settlement batch"),
        (21, 2, "3DS challenge handling"),
    ];
    for (id, project_id, title) in work_items {
        repository::upsert_work_item(
            conn,
            &WorkItemRecord {
                work_item_id: id,
                project_id,
                title: title.to_string(),
                created_at: Some(midday(today - Duration::days(30))),
            },
        )?;
    }

    // (bug_id, work_item_id, azure id, title, severity, status, days ago fixed)
    let bugs: [(i64, i64, &str, &str, Option<&str>, &str, Option<i64>); 10] = [
        (100, 10, "AZ-4311", "Cart total wrong after coupon", Some("High"), "Closed", Some(1)),
        (101, 10, "AZ-4312", "Checkout button unresponsive", Some("Critical"), "Closed", Some(1)),
        (102, 11, "AZ-4318", "Stock count drifts overnight", Some("Medium"), "Closed", Some(3)),
        (103, 11, "AZ-4323", "Duplicate SKU rows in export", Some("Low"), "Closed", Some(6)),
        (104, 20, "AZ-5102", "Settlement retries double-charge", Some("Critical"), "Closed", Some(2)),
        (105, 20, "AZ-5107", "Batch job stalls on DST change", Some("High"), "Closed", Some(9)),
        (106, 10, "AZ-4330", "Promo banner overlaps cart", Some("Low"), "Active", None),
        (107, 21, "AZ-5111", "3DS redirect loses session", Some("Critical"), "Active", None),
        (108, 21, "AZ-5114", "Challenge timeout too short", Some("Medium"), "Active", None),
        (109, 20, "AZ-5120", "Currency rounding off by a cent", None, "New", None),
    ];
    for (bug_id, work_item_id, azure_bug_id, title, severity, status, fixed_days_ago) in bugs {
        let created = today - Duration::days(20);
        let fixed_at = fixed_days_ago.map(|d| midday(today - Duration::days(d)));
        repository::upsert_bug(
            conn,
            &BugRecord {
                bug_id,
                work_item_id,
                azure_bug_id: azure_bug_id.to_string(),
                title: title.to_string(),
                severity: severity.map(str::to_string),
                status: status.to_string(),
                created_at: Some(midday(created)),
                fixed_at,
                fixed_by: fixed_days_ago.map(|_| "dana".to_string()),
                notes: None,
            },
        )?;
    }

    Ok(())
}

fn midday(d: NaiveDate) -> String {
    format!("{}T12:00:00Z", date_key(d))
}
