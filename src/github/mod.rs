// GitHub API module.
// Provides the caching, retrying client and types for the follower graph endpoints.

pub mod client;
pub mod endpoints;
pub mod pagination;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{GITHUB_API_BASE, GitHubClient};
pub use pagination::{MAX_PAGES, Pages, parse_next_link};
pub use transport::{HttpTransport, RawResponse, Transport};
pub use types::*;
