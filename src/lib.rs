pub mod date_util;
pub mod error;
pub mod reports;
pub mod resolve;
pub mod storage;

pub use error::{Error, Result};
pub use reports::{
    ActiveBugsRequest, ActiveBugsResponse, BugItem, BugStatistics, BugsByStatusRequest,
    BugsByStatusResponse, DailyTrend, FixTrendsRequest, FixTrendsResponse, ProjectBugCount,
    StatisticsRequest, StatisticsResponse, TrendGraphData,
};
pub use resolve::ProjectFilter;
pub use storage::Database;
