// Authority Gateway Module
// Narrow abstraction over the permission authority, the catalog and the
// generative-analytics service

pub mod error;
pub mod http;
pub mod service;
pub mod traits;
pub mod types;

pub use error::{GatewayError, GatewayResult};
pub use service::AuthorityGateway;
pub use traits::{AccessTokenProvider, AgentClient, AuthorityClient, CatalogClient};
pub use types::*;
