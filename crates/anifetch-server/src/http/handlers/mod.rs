//! HTTP request handlers.

mod acquisition;
mod health;
mod snapshots;

pub use acquisition::{episodes, latest_update, latest_update_post, search, video_play};
pub use health::{health_check, list_endpoints, metrics_handler, ENDPOINTS};
pub use snapshots::{get_snapshot, list_snapshots};
