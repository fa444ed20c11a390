//! Per-user reading: subscriptions, read/saved state and the dashboard.

pub mod dashboard;
pub mod service;
pub mod state;
pub mod subscription;

pub use dashboard::{
    Dashboard, DashboardArticle, DashboardQuery, DEFAULT_DASHBOARD_LIMIT, MAX_DASHBOARD_LIMIT,
};
pub use service::{AddedFeed, ReaderService};
pub use state::{ReadState, ReadStateRepository};
pub use subscription::SubscriptionRepository;
