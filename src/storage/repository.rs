use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

/// Canonical (id, name) pair for a project, as stored in `dim_projects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRef {
    pub project_id: i64,
    pub name: String,
}

/// A project row as exposed by the projects listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub project_id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// A work item to insert or update.
#[derive(Debug, Clone)]
pub struct WorkItemRecord {
    pub work_item_id: i64,
    pub project_id: i64,
    pub title: String,
    pub created_at: Option<String>,
}

/// A bug to insert or update. Date keys are derived from the timestamps.
#[derive(Debug, Clone)]
pub struct BugRecord {
    pub bug_id: i64,
    pub work_item_id: i64,
    pub azure_bug_id: String,
    pub title: String,
    pub severity: Option<String>,
    pub status: String,
    pub created_at: Option<String>,
    pub fixed_at: Option<String>,
    pub fixed_by: Option<String>,
    pub notes: Option<String>,
}

/// First 10 chars of an ISO-8601 timestamp, i.e. its YYYY-MM-DD date key.
fn date_key_from_iso(ts: &str) -> String {
    ts.get(..10).unwrap_or(ts).to_string()
}

// ── Projects ───────────────────────────────────────────────────────

pub fn upsert_project(
    conn: &Connection,
    project_id: i64,
    name: &str,
    description: Option<&str>,
    is_active: bool,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO dim_projects (project_id, name, description, is_active)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(project_id) DO UPDATE SET
             name=excluded.name, description=excluded.description,
             is_active=excluded.is_active",
        params![project_id, name, description, is_active as i32],
    )?;
    Ok(())
}

pub fn find_project_by_id(
    conn: &Connection,
    project_id: i64,
) -> Result<Option<ProjectRef>, rusqlite::Error> {
    conn.query_row(
        "SELECT project_id, name FROM dim_projects WHERE project_id = ?1",
        params![project_id],
        |row| {
            Ok(ProjectRef {
                project_id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )
    .optional()
}

/// Case-insensitive exact name match (the name column is COLLATE NOCASE).
pub fn find_project_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<ProjectRef>, rusqlite::Error> {
    conn.query_row(
        "SELECT project_id, name FROM dim_projects WHERE name = ?1",
        params![name],
        |row| {
            Ok(ProjectRef {
                project_id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )
    .optional()
}

/// Active projects, ordered by name.
pub fn list_projects(conn: &Connection) -> Result<Vec<ProjectSummary>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT project_id, name, description FROM dim_projects
         WHERE is_active = 1 ORDER BY name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(ProjectSummary {
            project_id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
        })
    })?;
    rows.collect()
}

/// All known projects by ascending id. Used for not-found hint messages.
pub fn list_project_refs(conn: &Connection) -> Result<Vec<ProjectRef>, rusqlite::Error> {
    let mut stmt =
        conn.prepare("SELECT project_id, name FROM dim_projects ORDER BY project_id")?;
    let rows = stmt.query_map([], |row| {
        Ok(ProjectRef {
            project_id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    rows.collect()
}

// ── Work items ─────────────────────────────────────────────────────

pub fn upsert_work_item(
    conn: &Connection,
    item: &WorkItemRecord,
) -> Result<(), rusqlite::Error> {
    let created_date_key = item.created_at.as_deref().map(date_key_from_iso);
    conn.execute(
        "INSERT INTO fact_work_items (work_item_id, project_id, title, created_at, created_date_key)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(work_item_id) DO UPDATE SET
             project_id=excluded.project_id, title=excluded.title,
             created_at=excluded.created_at, created_date_key=excluded.created_date_key",
        params![
            item.work_item_id,
            item.project_id,
            item.title,
            item.created_at,
            created_date_key,
        ],
    )?;
    Ok(())
}

// ── Bugs ───────────────────────────────────────────────────────────

pub fn upsert_bug(conn: &Connection, bug: &BugRecord) -> Result<(), rusqlite::Error> {
    let created_date_key = bug.created_at.as_deref().map(date_key_from_iso);
    let fixed_date_key = bug.fixed_at.as_deref().map(date_key_from_iso);
    conn.execute(
        "INSERT INTO fact_bugs (
            bug_id, work_item_id, azure_bug_id, title, severity, status,
            created_at, created_date_key, fixed_at, fixed_date_key, fixed_by, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(bug_id) DO UPDATE SET
            work_item_id=excluded.work_item_id, azure_bug_id=excluded.azure_bug_id,
            title=excluded.title, severity=excluded.severity, status=excluded.status,
            created_at=excluded.created_at, created_date_key=excluded.created_date_key,
            fixed_at=excluded.fixed_at, fixed_date_key=excluded.fixed_date_key,
            fixed_by=excluded.fixed_by, notes=excluded.notes",
        params![
            bug.bug_id,
            bug.work_item_id,
            bug.azure_bug_id,
            bug.title,
            bug.severity,
            bug.status,
            bug.created_at,
            created_date_key,
            bug.fixed_at,
            fixed_date_key,
            bug.fixed_by,
            bug.notes,
        ],
    )?;
    Ok(())
}

// ── Warehouse status ───────────────────────────────────────────────

/// Row counts for the status display: (projects, work items, bugs).
pub fn warehouse_counts(conn: &Connection) -> Result<(i64, i64, i64), rusqlite::Error> {
    let projects: i64 =
        conn.query_row("SELECT COUNT(*) FROM dim_projects", [], |row| row.get(0))?;
    let work_items: i64 =
        conn.query_row("SELECT COUNT(*) FROM fact_work_items", [], |row| row.get(0))?;
    let bugs: i64 = conn.query_row("SELECT COUNT(*) FROM fact_bugs", [], |row| row.get(0))?;
    Ok((projects, work_items, bugs))
}

// ── Config ─────────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO app_config (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}
