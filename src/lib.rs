pub mod config;
pub mod http;
pub mod prompts;
pub mod relay;
pub mod server;
pub mod store;
pub mod vendors;

pub use config::{Config, Secrets};
pub use http::{create_router, AppState};
pub use relay::{RelayKind, RelayRoute, RelayStats, VendorEndpoint};
pub use server::Server;
pub use store::{Article, ArticleStore, Transcript, TranscriptStore, Turn};
pub use vendors::Vendors;
