pub mod contract;
pub mod engine;
pub mod insight;
pub mod poller;
pub mod prompt;
pub mod session;

pub use engine::{DocumentSummary, InsightEngine};
pub use news_client::{Freshness, MatchMode};
pub use poller::{DocumentIndex, PollOutcome};
pub use session::SessionState;
