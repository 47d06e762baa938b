//! Access to the platform REST API: endpoint table, gateway, fetchers and search.

pub mod endpoint;
pub mod fetcher;
pub mod gateway;
pub mod search;

pub use endpoint::{ResourceType, Verb};
pub use fetcher::{ObjectFetcher, extract_ids, ids_of_associated};
pub use gateway::{ApiGateway, ApiReply};
pub use search::{SearchIndexClient, SearchOutcome};
