//! lecout - Cost-source records and query core
//!
//! *Le Coût* (The Cost) - Resource, recommendation, and budget records plus the
//! pure scoping, filtering, pagination, and summary logic plugins run over them.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Error types for malformed input
pub mod error;

/// Resource scoping (target resources)
pub mod matcher;

/// Recommendation selection and ordering
pub mod filter;

/// Request/response messages for each RPC method
pub mod messages;

/// Cost, pricing, recommendation, and budget records
pub mod model;

/// Offset pagination with opaque page tokens
pub mod pagination;

/// Recommendation summary aggregation
pub mod summary;

/// Per-field validators
pub mod validate;

pub use error::{CoutError, Result};
pub use filter::{apply, apply_at, select};
pub use matcher::{matches, matches_any, scope};
pub use messages::RpcMethod;
pub use model::{
    ActionType, Budget, BudgetFilter, BudgetHealth, CostPoint, FallbackHint, Impact, PricingSpec,
    Priority, Recommendation, RecommendationCategory, RecommendationFilter, ResourceDescriptor,
    ResourceRecommendationInfo, SortBy, SortOrder,
};
pub use pagination::{paginate, Base64OffsetCodec, Page, PageTokenCodec, DEFAULT_PAGE_SIZE};
pub use summary::{summarize, RecommendationSummary};
