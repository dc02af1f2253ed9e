pub mod types;

pub use types::*;

use std::collections::HashMap;

use chrono::{Duration, Local, NaiveDate};
use serde_json::json;

use crate::date_util::{date_key, date_range};
use crate::error::{Error, Result};
use crate::resolve::resolve_filter;
use crate::storage::Database;

/// Compute the bug-fix trend over the last `days_back` days.
///
/// The window runs from `today - days_back` through today, both ends
/// inclusive, so the response always holds `days_back + 1` daily entries.
/// Days without any closure are zero-filled rather than omitted.
pub async fn fix_trends(db: &Database, request: &FixTrendsRequest) -> Result<FixTrendsResponse> {
    if !(1..=365).contains(&request.days_back) {
        return Err(Error::InvalidArgument(format!(
            "days_back must be between 1 and 365, got {}",
            request.days_back
        )));
    }

    let filter = resolve_filter(db, request.project_id, request.project_name.clone()).await?;

    let period_end = Local::now().date_naive();
    let period_start = period_end - Duration::days(i64::from(request.days_back));

    let sql_query = if filter.project_id().is_some() {
        "SELECT b.fixed_date_key AS fix_date, COUNT(*) AS fixed_count
         FROM fact_bugs b
         JOIN fact_work_items w ON w.work_item_id = b.work_item_id
         WHERE b.fixed_date_key IS NOT NULL
           AND b.fixed_date_key >= ?1
           AND b.fixed_date_key <= ?2
           AND w.project_id = ?3
           AND b.status = 'Closed'
         GROUP BY b.fixed_date_key
         ORDER BY fix_date"
            .to_string()
    } else {
        "SELECT b.fixed_date_key AS fix_date, COUNT(*) AS fixed_count
         FROM fact_bugs b
         WHERE b.fixed_date_key IS NOT NULL
           AND b.fixed_date_key >= ?1
           AND b.fixed_date_key <= ?2
           AND b.status = 'Closed'
         GROUP BY b.fixed_date_key
         ORDER BY fix_date"
            .to_string()
    };

    log::info!(
        "Computing bug fix trends: days_back={}, project={:?}",
        request.days_back,
        filter.project_name()
    );

    let sql = sql_query.clone();
    let start_key = date_key(period_start);
    let end_key = date_key(period_end);
    let project_id = filter.project_id();
    let raw: Vec<(String, i64)> = db
        .reader()
        .call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = if let Some(pid) = project_id {
                stmt.query_map(rusqlite::params![start_key, end_key, pid], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?
                .collect::<std::result::Result<Vec<(String, i64)>, _>>()?
            } else {
                stmt.query_map(rusqlite::params![start_key, end_key], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?
                .collect::<std::result::Result<Vec<(String, i64)>, _>>()?
            };
            Ok::<_, rusqlite::Error>(rows)
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

    let daily_aggregation = fill_missing_dates(&raw, period_start, period_end);
    let total_fixed_bugs: i64 = daily_aggregation.iter().map(|t| t.fixed_count).sum();

    let trend_graph_data = TrendGraphData {
        labels: daily_aggregation.iter().map(|t| t.date.clone()).collect(),
        values: daily_aggregation.iter().map(|t| t.fixed_count).collect(),
    };

    log::info!("Bug fix trends complete: {total_fixed_bugs} bugs fixed in period");

    Ok(FixTrendsResponse {
        total_fixed_bugs,
        daily_aggregation,
        trend_graph_data,
        sql_query,
        period_start: date_key(period_start),
        period_end: date_key(period_end),
        project_id: filter.project_id(),
        project_name: filter.project_name().map(str::to_string),
    })
}

/// List bugs whose status is exactly `Active`, optionally restricted by
/// severity and project. No pagination; ordering is whatever the store
/// returns, stable within a single query.
pub async fn active_bugs(
    db: &Database,
    request: &ActiveBugsRequest,
) -> Result<ActiveBugsResponse> {
    let filter = resolve_filter(db, request.project_id, request.project_name.clone()).await?;

    let project_id = filter.project_id();
    let severity = request.severity.clone();
    let bugs: Vec<BugItem> = db
        .reader()
        .call(move |conn| {
            let mut sql = String::from(
                "SELECT b.bug_id, b.azure_bug_id, b.title, b.severity, b.status,
                        b.created_date_key, b.notes
                 FROM fact_bugs b",
            );
            let mut wheres = vec!["b.status = 'Active'".to_string()];
            let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
            if let Some(pid) = project_id {
                sql.push_str(" JOIN fact_work_items w ON w.work_item_id = b.work_item_id");
                wheres.push(format!("w.project_id = ?{}", params.len() + 1));
                params.push(Box::new(pid));
            }
            if let Some(ref sev) = severity {
                wheres.push(format!("b.severity = ?{}", params.len() + 1));
                params.push(Box::new(sev.clone()));
            }
            sql.push_str(" WHERE ");
            sql.push_str(&wheres.join(" AND "));

            let param_refs: Vec<&dyn rusqlite::types::ToSql> =
                params.iter().map(|p| p.as_ref()).collect();
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(param_refs.as_slice(), bug_item_from_row)?;
            rows.collect::<std::result::Result<Vec<BugItem>, _>>()
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

    let mut filters_applied = serde_json::Map::new();
    if let Some(name) = filter.project_name() {
        filters_applied.insert("project".to_string(), json!(name));
    }
    if let Some(ref sev) = request.severity {
        filters_applied.insert("severity".to_string(), json!(sev));
    }

    Ok(ActiveBugsResponse {
        total_active_bugs: bugs.len() as i64,
        bugs,
        filters_applied,
        project_id: filter.project_id(),
        project_name: filter.project_name().map(str::to_string),
    })
}

/// List bugs whose status exactly matches the caller-supplied string,
/// newest (highest bug id) first, truncated to `limit`. An unrecognized
/// status yields an empty result, not an error.
pub async fn bugs_by_status(
    db: &Database,
    request: &BugsByStatusRequest,
) -> Result<BugsByStatusResponse> {
    if !(1..=500).contains(&request.limit) {
        return Err(Error::InvalidArgument(format!(
            "limit must be between 1 and 500, got {}",
            request.limit
        )));
    }

    let filter = resolve_filter(db, request.project_id, request.project_name.clone()).await?;

    let project_id = filter.project_id();
    let status = request.status.clone();
    let limit = request.limit;
    let bugs: Vec<BugItem> = db
        .reader()
        .call(move |conn| {
            let mut sql = String::from(
                "SELECT b.bug_id, b.azure_bug_id, b.title, b.severity, b.status,
                        b.created_date_key, b.notes
                 FROM fact_bugs b",
            );
            let mut wheres = vec!["b.status = ?1".to_string()];
            let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(status)];
            if let Some(pid) = project_id {
                sql.push_str(" JOIN fact_work_items w ON w.work_item_id = b.work_item_id");
                wheres.push(format!("w.project_id = ?{}", params.len() + 1));
                params.push(Box::new(pid));
            }
            sql.push_str(" WHERE ");
            sql.push_str(&wheres.join(" AND "));
            // limit is validated to 1..=500 above
            sql.push_str(&format!(" ORDER BY b.bug_id DESC LIMIT {limit}"));

            let param_refs: Vec<&dyn rusqlite::types::ToSql> =
                params.iter().map(|p| p.as_ref()).collect();
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(param_refs.as_slice(), bug_item_from_row)?;
            rows.collect::<std::result::Result<Vec<BugItem>, _>>()
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

    Ok(BugsByStatusResponse {
        status: request.status.clone(),
        total_count: bugs.len() as i64,
        bugs,
        project_id: filter.project_id(),
        project_name: filter.project_name().map(str::to_string),
    })
}

/// Compute cross-cutting bug statistics: counts by status, by severity,
/// and per project. The per-project breakdown is always global: it
/// answers "how are bugs distributed across projects" and keeps zero-bug
/// projects via the left join, whatever filter was requested.
pub async fn statistics(
    db: &Database,
    request: &StatisticsRequest,
) -> Result<StatisticsResponse> {
    let filter = resolve_filter(db, request.project_id, request.project_name.clone()).await?;

    let project_id = filter.project_id();
    let (status_counts, severity_counts, by_project) = db
        .reader()
        .call(move |conn| {
            let (join, status_where, severity_and) = if project_id.is_some() {
                (
                    " JOIN fact_work_items w ON w.work_item_id = b.work_item_id",
                    " WHERE w.project_id = ?1",
                    " AND w.project_id = ?1",
                )
            } else {
                ("", "", "")
            };

            let sql = format!(
                "SELECT b.status, COUNT(*) FROM fact_bugs b{join}{status_where} GROUP BY b.status"
            );
            let status_counts = grouped_counts(conn, &sql, project_id)?;

            let sql = format!(
                "SELECT b.severity, COUNT(*) FROM fact_bugs b{join}
                 WHERE b.severity IS NOT NULL{severity_and}
                 GROUP BY b.severity"
            );
            let severity_counts = grouped_counts(conn, &sql, project_id)?;

            let mut stmt = conn.prepare(
                "SELECT p.project_id, p.name, COUNT(b.bug_id)
                 FROM dim_projects p
                 LEFT JOIN fact_work_items w ON w.project_id = p.project_id
                 LEFT JOIN fact_bugs b ON b.work_item_id = w.work_item_id
                 GROUP BY p.project_id, p.name
                 ORDER BY p.name",
            )?;
            let by_project = stmt
                .query_map([], |row| {
                    Ok(ProjectBugCount {
                        project_id: row.get(0)?,
                        project_name: row.get(1)?,
                        bug_count: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok::<_, rusqlite::Error>((status_counts, severity_counts, by_project))
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

    let count_for = |status: &str| {
        status_counts
            .iter()
            .find(|(s, _)| s == status)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    };
    let statistics = BugStatistics {
        total_bugs: status_counts.iter().map(|(_, n)| n).sum(),
        active_bugs: count_for("Active"),
        closed_bugs: count_for("Closed"),
        new_bugs: count_for("New"),
        by_severity: severity_counts.into_iter().collect(),
        by_project,
    };

    Ok(StatisticsResponse {
        statistics,
        generated_at: Local::now().to_rfc3339(),
        project_id: filter.project_id(),
        project_name: filter.project_name().map(str::to_string),
    })
}

// ── Internal helpers ───────────────────────────────────────────────

fn bug_item_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<BugItem, rusqlite::Error> {
    Ok(BugItem {
        bug_id: row.get(0)?,
        azure_bug_id: row.get(1)?,
        title: row.get(2)?,
        severity: row.get(3)?,
        status: row.get(4)?,
        created_date: row.get(5)?,
        notes: row.get(6)?,
    })
}

fn grouped_counts(
    conn: &rusqlite::Connection,
    sql: &str,
    project_id: Option<i64>,
) -> std::result::Result<Vec<(String, i64)>, rusqlite::Error> {
    let mut stmt = conn.prepare(sql)?;
    if let Some(pid) = project_id {
        stmt.raw_bind_parameter(1, pid)?;
    }
    let mut counts = Vec::new();
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        counts.push((row.get::<_, String>(0)?, row.get::<_, i64>(1)?));
    }
    Ok(counts)
}

/// Expand sparse (date, count) rows into one entry per calendar day from
/// `start` through `end` inclusive, defaulting absent days to zero.
fn fill_missing_dates(raw: &[(String, i64)], start: NaiveDate, end: NaiveDate) -> Vec<DailyTrend> {
    let counts: HashMap<&str, i64> = raw.iter().map(|(d, c)| (d.as_str(), *c)).collect();
    date_range(start, end)
        .into_iter()
        .map(|d| {
            let date = date_key(d);
            let fixed_count = counts.get(date.as_str()).copied().unwrap_or(0);
            DailyTrend { date, fixed_count }
        })
        .collect()
}
