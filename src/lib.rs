// follow-fellow: find and clean up one-sided GitHub follows.
// Library behind the command line and the web dashboard.

pub mod analyze;
pub mod backoff;
pub mod cache;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod github;
pub mod report;
pub mod web;

pub use analyze::{FollowAnalysis, FollowReport, FollowStats, analyze, build_report};
pub use cleanup::{CleanupOutcome, cleanup};
pub use config::{ConfigArgs, Settings};
pub use context::{Limits, RunContext};
pub use error::{FellowError, Result};
pub use github::GitHubClient;
