mod entries;
pub mod error_code;
pub mod health;
pub mod helpers;
pub mod routes;
pub mod types;

pub use entries::*;
pub use error_code::ErrorCode;
pub use health::{AppStartTime, HealthService};
pub use routes::{entry_routes, health_routes, json_config, query_config};
pub use types::{ApiResponse, DateQuery, EntryKeyQuery, HealthResponse, RangeQuery};
