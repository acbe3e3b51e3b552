//! GraphQL client fetching live account state from an indexing service.
//!
//! # Example
//!
//! ```ignore
//! use cellbridge_gql::GqlClient;
//!
//! let client = GqlClient::new();
//! let info = client
//!     .get_account_info("https://example.org/graphql", "-1:5555...5555")
//!     .unwrap();
//! let code = info.code_cell().unwrap();
//! let balance = info.balance_int().unwrap();
//! ```

mod account;
mod client;
mod error;
mod query;

pub use account::AccountInfo;
pub use client::{AccountFetcher, GqlClient};
pub use error::GqlError;
pub use query::{build_query, request_body, strip_whitespace};
