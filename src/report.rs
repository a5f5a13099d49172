// Plain-text rendering for the command line.
// Formats analysis reports, cleanup outcomes, and run statistics.

use std::fmt::Write;

use crate::analyze::FollowReport;
use crate::cleanup::CleanupOutcome;
use crate::context::RequestStatus;
use crate::github::UserSummary;

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}", title);
    let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));
}

fn user_line(user: &UserSummary) -> String {
    let mut line = format!("  - {}", user.username);
    if let Some(name) = &user.name {
        let _ = write!(line, " ({})", name);
    }
    if let Some(followers) = user.followers {
        let _ = write!(line, " - {} followers", followers);
    }
    line
}

/// Summary, one-sided follows, and followers not followed back.
pub fn render_report(report: &FollowReport) -> String {
    let mut out = String::new();
    let stats = &report.stats;

    heading(&mut out, &format!("Follow summary for {}", report.user));
    let _ = writeln!(out, "Followers:             {}", stats.total_followers);
    let _ = writeln!(out, "Following:             {}", stats.total_following);
    let _ = writeln!(out, "Mutual:                {}", stats.mutual_follows);
    let _ = writeln!(out, "One-sided:             {}", stats.one_sided_follows);
    let _ = writeln!(out, "Not followed back:     {}", stats.not_following_back);

    if report.one_sided.is_empty() {
        let _ = writeln!(out, "\nNo one-sided follows, every follow is mutual.");
    } else {
        heading(&mut out, &format!("One-sided follows ({})", report.one_sided.len()));
        let _ = writeln!(out, "{} follows these users, who do not follow back:", report.user);
        for user in &report.one_sided {
            let _ = writeln!(out, "{}", user_line(user));
        }
    }

    if report.not_following_back.is_empty() {
        let _ = writeln!(out, "\n{} follows back every follower.", report.user);
    } else {
        heading(
            &mut out,
            &format!("Followers not followed back ({})", report.not_following_back.len()),
        );
        for user in &report.not_following_back {
            let _ = writeln!(out, "{}", user_line(user));
        }
    }

    let limits = &report.processing_limits;
    if limits.one_sided_truncated || limits.not_following_back_truncated {
        let _ = writeln!(
            out,
            "\nDetails were loaded for the first {} users of each group only.",
            limits.max_users_to_process
        );
    }
    out
}

/// What a cleanup pass did, or would have done.
pub fn render_cleanup(outcome: &CleanupOutcome) -> String {
    let mut out = String::new();

    if outcome.dry_run {
        heading(&mut out, "Dry run");
        let _ = writeln!(out, "Would unfollow {} users:", outcome.processed);
        for user in &outcome.users {
            let _ = writeln!(out, "  - {}", user);
        }
    } else {
        heading(&mut out, "Cleanup finished");
        let _ = writeln!(out, "Unfollowed: {}", outcome.unfollowed.len());
        let _ = writeln!(out, "Failed:     {}", outcome.failed.len());
        for user in &outcome.failed {
            let _ = writeln!(out, "  - {}", user);
        }
    }

    if !outcome.skipped.is_empty() {
        let _ = writeln!(out, "Skipped:    {}", outcome.skipped.len());
    }
    if let Some(reason) = &outcome.aborted {
        let _ = writeln!(out, "Stopped early: {}", reason);
    }
    out
}

/// One-line request accounting for the end of a run.
pub fn render_run_stats(status: &RequestStatus) -> String {
    let mut line = format!(
        "API requests: {}/{} ({}%), cache hits: {}, retried: {}, failed: {}",
        status.current_requests,
        status.max_requests,
        status.usage_percentage,
        status.cache_hits,
        status.retries,
        status.failures,
    );
    if let Some(rate_limit) = &status.github_rate_limit {
        let _ = write!(
            line,
            ", GitHub rate limit: {}/{}",
            rate_limit.remaining, rate_limit.limit
        );
    }
    line
}
