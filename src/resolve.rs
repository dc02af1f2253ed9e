use rusqlite::Connection;

use crate::error::{Error, Result};
use crate::storage::repository::{self, ProjectRef};
use crate::storage::Database;

/// The project restriction applied to a report.
///
/// Invariant: a filter is either fully resolved (canonical id and name from
/// `dim_projects`, never the caller-supplied spelling) or absent entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectFilter {
    Unfiltered,
    Resolved {
        project_id: i64,
        project_name: String,
    },
}

impl ProjectFilter {
    pub fn project_id(&self) -> Option<i64> {
        match self {
            ProjectFilter::Unfiltered => None,
            ProjectFilter::Resolved { project_id, .. } => Some(*project_id),
        }
    }

    pub fn project_name(&self) -> Option<&str> {
        match self {
            ProjectFilter::Unfiltered => None,
            ProjectFilter::Resolved { project_name, .. } => Some(project_name),
        }
    }
}

enum Resolution {
    Found(ProjectRef),
    UnknownId(i64, Vec<ProjectRef>),
    UnknownName(String, Vec<ProjectRef>),
}

/// Resolve an optional project id / name pair to a [`ProjectFilter`].
///
/// When both are supplied the id wins and the name is ignored. When neither
/// is supplied this returns [`ProjectFilter::Unfiltered`] without touching
/// the store. A lookup miss is a [`Error::NotFound`] naming the requested
/// identifier and listing the known projects when there are any.
pub async fn resolve_filter(
    db: &Database,
    project_id: Option<i64>,
    project_name: Option<String>,
) -> Result<ProjectFilter> {
    if project_id.is_none() && project_name.is_none() {
        return Ok(ProjectFilter::Unfiltered);
    }

    let resolution = db
        .reader()
        .call(move |conn| lookup(conn, project_id, project_name.as_deref()))
        .await?;

    match resolution {
        Resolution::Found(project) => {
            log::debug!(
                "Resolved project filter to {} ({})",
                project.project_id,
                project.name
            );
            Ok(ProjectFilter::Resolved {
                project_id: project.project_id,
                project_name: project.name,
            })
        }
        Resolution::UnknownId(id, known) => {
            Err(Error::NotFound(with_id_hint(id, &known)))
        }
        Resolution::UnknownName(name, known) => {
            Err(Error::NotFound(with_name_hint(&name, &known)))
        }
    }
}

// Id takes priority over name; the name is only consulted when no id was given.
fn lookup(
    conn: &Connection,
    project_id: Option<i64>,
    project_name: Option<&str>,
) -> std::result::Result<Resolution, rusqlite::Error> {
    if let Some(id) = project_id {
        return match repository::find_project_by_id(conn, id)? {
            Some(project) => Ok(Resolution::Found(project)),
            None => Ok(Resolution::UnknownId(id, repository::list_project_refs(conn)?)),
        };
    }
    // lookup() is only called with at least one of id/name present
    let name = project_name.unwrap_or_default();
    match repository::find_project_by_name(conn, name)? {
        Some(project) => Ok(Resolution::Found(project)),
        None => Ok(Resolution::UnknownName(
            name.to_string(),
            repository::list_project_refs(conn)?,
        )),
    }
}

fn with_id_hint(id: i64, known: &[ProjectRef]) -> String {
    if known.is_empty() {
        return format!("project with id {id} not found");
    }
    let ids: Vec<String> = known
        .iter()
        .map(|p| format!("{} ({})", p.project_id, p.name))
        .collect();
    format!(
        "project with id {id} not found. Available projects: {}",
        ids.join(", ")
    )
}

fn with_name_hint(name: &str, known: &[ProjectRef]) -> String {
    if known.is_empty() {
        return format!("project '{name}' not found");
    }
    let names: Vec<&str> = known.iter().map(|p| p.name.as_str()).collect();
    format!(
        "project '{name}' not found. Available projects: {}",
        names.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repository::upsert_project;

    async fn seeded_db() -> Database {
        let db = Database::open_memory().await.unwrap();
        db.writer()
            .call(|conn| {
                upsert_project(conn, 1, "HotRetailSys", None, true)?;
                upsert_project(conn, 2, "PaymentsGateway", None, true)?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_unfiltered_passthrough() {
        // No projects exist at all; resolution must not even look
        let db = Database::open_memory().await.unwrap();
        let filter = resolve_filter(&db, None, None).await.unwrap();
        assert_eq!(filter, ProjectFilter::Unfiltered);
    }

    #[tokio::test]
    async fn test_resolve_by_id() {
        let db = seeded_db().await;
        let filter = resolve_filter(&db, Some(2), None).await.unwrap();
        assert_eq!(
            filter,
            ProjectFilter::Resolved {
                project_id: 2,
                project_name: "PaymentsGateway".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_by_name_case_insensitive() {
        let db = seeded_db().await;
        let filter = resolve_filter(&db, None, Some("hotretailsys".to_string()))
            .await
            .unwrap();
        // Canonical spelling comes from the store, not the caller
        assert_eq!(filter.project_name(), Some("HotRetailSys"));
        assert_eq!(filter.project_id(), Some(1));
    }

    #[tokio::test]
    async fn test_id_takes_priority_over_name() {
        let db = seeded_db().await;
        let filter = resolve_filter(&db, Some(2), Some("HotRetailSys".to_string()))
            .await
            .unwrap();
        assert_eq!(filter.project_id(), Some(2));
        assert_eq!(filter.project_name(), Some("PaymentsGateway"));
    }

    #[tokio::test]
    async fn test_unknown_id_not_found_with_hint() {
        let db = seeded_db().await;
        let err = resolve_filter(&db, Some(9999), None).await.unwrap_err();
        match err {
            Error::NotFound(msg) => {
                assert!(msg.contains("9999"));
                assert!(msg.contains("1 (HotRetailSys)"));
                assert!(msg.contains("2 (PaymentsGateway)"));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_name_not_found_with_hint() {
        let db = seeded_db().await;
        let err = resolve_filter(&db, None, Some("NoSuchProject".to_string()))
            .await
            .unwrap_err();
        match err {
            Error::NotFound(msg) => {
                assert!(msg.contains("NoSuchProject"));
                assert!(msg.contains("HotRetailSys"));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_not_found_without_hint_when_store_empty() {
        let db = Database::open_memory().await.unwrap();
        let err = resolve_filter(&db, Some(1), None).await.unwrap_err();
        match err {
            Error::NotFound(msg) => assert!(!msg.contains("Available")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
