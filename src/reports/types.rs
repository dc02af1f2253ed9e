use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

fn default_days_back() -> u32 {
    10
}

fn default_limit() -> u32 {
    50
}

/// Request for the fix-trend report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixTrendsRequest {
    /// Number of days to look back from today (1-365).
    #[serde(default = "default_days_back")]
    pub days_back: u32,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub project_name: Option<String>,
}

impl Default for FixTrendsRequest {
    fn default() -> Self {
        Self {
            days_back: default_days_back(),
            project_id: None,
            project_name: None,
        }
    }
}

/// Bugs fixed on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTrend {
    pub date: String,
    pub fixed_count: i64,
}

/// Chart-ready view of the daily aggregation: `labels[i]` and `values[i]`
/// correspond to `daily_aggregation[i]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendGraphData {
    pub labels: Vec<String>,
    pub values: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixTrendsResponse {
    pub total_fixed_bugs: i64,
    /// One entry per calendar day from `period_start` to `period_end`
    /// inclusive, ascending, zero-filled for days without closures.
    pub daily_aggregation: Vec<DailyTrend>,
    pub trend_graph_data: TrendGraphData,
    /// The exact query text that was executed, surfaced for debuggability.
    pub sql_query: String,
    pub period_start: String,
    pub period_end: String,
    pub project_id: Option<i64>,
    pub project_name: Option<String>,
}

/// Request for the active-bug listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveBugsRequest {
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub project_name: Option<String>,
    /// Exact severity match (Low, Medium, High, Critical).
    #[serde(default)]
    pub severity: Option<String>,
}

/// A single bug row in a listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugItem {
    pub bug_id: i64,
    pub azure_bug_id: String,
    pub title: String,
    pub severity: Option<String>,
    pub status: String,
    pub created_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveBugsResponse {
    pub total_active_bugs: i64,
    pub bugs: Vec<BugItem>,
    /// The filters that were actually applied to the listing.
    pub filters_applied: serde_json::Map<String, serde_json::Value>,
    pub project_id: Option<i64>,
    pub project_name: Option<String>,
}

/// Request for the by-status listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugsByStatusRequest {
    /// Exact status match. Unknown statuses yield an empty result, not an error.
    pub status: String,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub project_name: Option<String>,
    /// Maximum rows to return (1-500).
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugsByStatusResponse {
    pub status: String,
    pub total_count: i64,
    pub bugs: Vec<BugItem>,
    pub project_id: Option<i64>,
    pub project_name: Option<String>,
}

/// Request for the statistics report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsRequest {
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub project_name: Option<String>,
}

/// Bug count for one project in the cross-project breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectBugCount {
    pub project_id: i64,
    pub project_name: String,
    pub bug_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BugStatistics {
    /// All bugs in the filtered population, whatever their status.
    pub total_bugs: i64,
    pub active_bugs: i64,
    pub closed_bugs: i64,
    pub new_bugs: i64,
    /// Counts keyed by severity; bugs without a severity are not counted here.
    pub by_severity: BTreeMap<String, i64>,
    /// Always global across every project, including projects with zero
    /// bugs, regardless of the requested filter.
    pub by_project: Vec<ProjectBugCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsResponse {
    pub statistics: BugStatistics,
    pub generated_at: String,
    pub project_id: Option<i64>,
    pub project_name: Option<String>,
}
