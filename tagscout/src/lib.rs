pub mod config;
pub mod credentials;
pub mod errors;
pub mod ingest;
pub mod metrics;
pub mod node;
pub mod pool;
pub mod search;
pub mod server;
pub mod traversal;
pub mod words;

pub use config::TagScoutConfig;
pub use credentials::CredentialStore;
pub use errors::{TagScoutError, TagScoutResult};
pub use node::{Node, TreeNode};
pub use search::{search, CancelSignal, SearchOptions, SearchOutcome};
