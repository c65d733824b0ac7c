pub mod config;
pub mod error;
pub mod identity;
pub mod types;

pub use config::Config;
pub use error::InsightError;
pub use identity::{is_home_org, normalize_org_name, HOME_ORG};
pub use types::*;
