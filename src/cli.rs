// Command-line interface.
// Parses flags and drives one analysis and cleanup pass, or serves the dashboard.

use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::Parser;
use inquire::Confirm;
use tracing::info;

use crate::analyze::{analyze, build_report};
use crate::cleanup::cleanup;
use crate::config::{ConfigArgs, Settings};
use crate::context::RunContext;
use crate::github::GitHubClient;
use crate::report;
use crate::web::{self, AppState};

/// Find GitHub accounts you follow that do not follow you back, and unfollow them.
#[derive(Debug, Parser)]
#[command(name = "follow-fellow", version, about)]
pub struct Cli {
    /// Only show who would be unfollowed
    #[arg(long)]
    pub dry_run: bool,

    /// Unfollow without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Serve the web dashboard instead of running once
    #[arg(long)]
    pub web: bool,

    /// Dashboard bind host
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Dashboard port
    #[arg(short, long, default_value_t = 5000)]
    pub port: u16,

    /// Remove all cached API responses before running
    #[arg(long)]
    pub clear_cache: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let settings = Settings::from(self.config.clone());
        let cache = settings
            .cache()
            .context("could not open the response cache")?;

        if self.clear_cache {
            let removed = cache.clear()?;
            info!(removed, "cleared response cache");
        }

        if self.web {
            println!("Dashboard running at http://{}:{}", self.host, self.port);
            web::run(&self.host, self.port, AppState::new(settings, cache)).await?;
            return Ok(());
        }

        let client = settings.client(cache)?;
        let mut ctx = settings.run_context();
        self.run_pass(&settings, &client, &mut ctx, &mut std::io::stdout())
            .await
    }

    /// One analysis and cleanup pass. The run statistics are written last,
    /// whether or not the pass succeeded.
    pub async fn run_pass(
        &self,
        settings: &Settings,
        client: &GitHubClient,
        ctx: &mut RunContext,
        out: &mut dyn Write,
    ) -> Result<()> {
        let result = self.analyze_and_clean(settings, client, ctx, out).await;
        writeln!(out, "\n{}", report::render_run_stats(&ctx.request_status()))?;
        result
    }

    async fn analyze_and_clean(
        &self,
        settings: &Settings,
        client: &GitHubClient,
        ctx: &mut RunContext,
        out: &mut dyn Write,
    ) -> Result<()> {
        let user = settings.resolve_username(client, ctx).await?;
        let analysis = analyze(client, ctx, &user).await?;
        let follow_report = build_report(client, ctx, &user, &analysis).await?;
        write!(out, "{}", report::render_report(&follow_report))?;

        if analysis.one_sided.is_empty() {
            return Ok(());
        }

        if !self.dry_run && !self.yes {
            out.flush()?;
            let prompt = format!("Unfollow {} accounts?", analysis.one_sided.len());
            let confirmed = Confirm::new(&prompt)
                .with_default(false)
                .with_help_message(
                    "Accounts that do not follow back are removed from your following list",
                )
                .prompt()?;
            if !confirmed {
                writeln!(out, "Nothing was unfollowed.")?;
                return Ok(());
            }
        }

        let outcome = cleanup(client, ctx, &user, &analysis.one_sided, self.dry_run).await;
        write!(out, "{}", report::render_cleanup(&outcome))?;

        if let Some(reason) = outcome.aborted {
            bail!("cleanup stopped early: {}", reason);
        }
        if !outcome.failed.is_empty() {
            bail!("{} unfollows failed", outcome.failed.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Limits;
    use crate::github::testing::{BASE, ScriptedTransport, client, logins_json, ok, response};
    use reqwest::Method;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["follow-fellow", "--username", "me"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn graph() -> ScriptedTransport {
        ScriptedTransport::new()
            .get(
                &format!("{}/users/me/followers?per_page=100", BASE),
                vec![ok(&logins_json(&["a"]))],
            )
            .get(
                &format!("{}/users/me/following?per_page=100", BASE),
                vec![ok(&logins_json(&["a", "d"]))],
            )
    }

    async fn run(cli: &Cli, transport: ScriptedTransport, limits: Limits) -> (Result<()>, String) {
        let settings = Settings::from(cli.config.clone());
        let (client, _transport, _cache) = client(transport);
        let mut ctx = RunContext::new(limits);
        let mut out = Vec::new();

        let result = cli.run_pass(&settings, &client, &mut ctx, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_flags() {
        let cli = cli(&["--dry-run", "--web", "--port", "8080", "--clear-cache", "-y"]);
        assert!(cli.dry_run && cli.web && cli.clear_cache && cli.yes);
        assert_eq!(cli.port, 8080);
        assert_eq!(cli.host, "127.0.0.1");
        assert_eq!(cli.config.username.as_deref(), Some("me"));
    }

    #[tokio::test]
    async fn test_dry_run_pass() {
        let (result, out) = run(&cli(&["--dry-run"]), graph(), Limits::default()).await;

        result.unwrap();
        assert!(out.contains("Follow summary for me"));
        assert!(out.contains("Would unfollow 1 users:"));
        assert!(out.contains("  - d"));
        assert!(out.trim_end().ends_with("failed: 1"));
    }

    #[tokio::test]
    async fn test_stats_printed_when_analysis_fails() {
        // Followers 404: the pass fails before any report is printed.
        let transport = ScriptedTransport::new();
        let (result, out) = run(&cli(&["--yes"]), transport, Limits::default()).await;

        assert!(result.is_err());
        assert!(!out.contains("Follow summary"));
        assert!(out.contains("API requests: 1/2500"));
        assert!(out.contains("failed: 1"));
    }

    #[tokio::test]
    async fn test_stats_printed_when_budget_exceeded() {
        let transport = ScriptedTransport::new().get(
            &format!("{}/users/me/followers?per_page=100", BASE),
            vec![response(422, "nope", &[])],
        );
        let limits = Limits {
            max_errors: 0,
            ..Limits::default()
        };
        let (result, out) = run(&cli(&["--yes"]), transport, limits).await;

        assert!(result.is_err());
        assert!(out.contains("API requests: 1/2500"));
        assert!(out.contains("failed: 1"));
    }

    #[tokio::test]
    async fn test_failed_unfollow_fails_the_run() {
        let transport = graph().route(
            Method::DELETE,
            &format!("{}/user/following/d", BASE),
            vec![response(422, "nope", &[])],
        );
        let (result, out) = run(&cli(&["--yes"]), transport, Limits::default()).await;

        assert!(result.unwrap_err().to_string().contains("1 unfollows failed"));
        assert!(out.contains("Cleanup finished"));
        assert!(out.contains("API requests:"));
    }
}
