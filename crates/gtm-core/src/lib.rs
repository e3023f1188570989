//! GTM Core - Google Tag Manager administration for AI assistants
//!
//! Resource model, partial-update reconciliation, the Tag Manager REST
//! client and the tool dispatch logic shared by the MCP server.

pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod http;
pub mod paginate;
pub mod reconcile;
pub mod resource;
pub mod store;
pub mod tag;

pub use config::Config;
pub use context::GtmContext;
pub use error::{normalize, GtmError, NormalizedError, RemoteFault};
pub use resource::{Parameter, Tag, TagPath, TagPayload, WorkspacePath};
pub use store::TagStore;
