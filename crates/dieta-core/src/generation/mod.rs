//! Client interface for the remote diet generation service.
//!
//! ```text
//! PlanCacheController
//!     |
//!     | generate(profile)   (exactly once per request, no retry)
//!     v
//! Arc<dyn GenerationClient> --POST /create--> generation service
//! ```

pub mod http;
pub mod trait_def;

pub use http::HttpGenerationClient;
pub use trait_def::GenerationClient;
