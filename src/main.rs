use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use action_audit::analyzer::{Issue, IssueAnalyzer, RuleSet};
use action_audit::config::{self, AuditConfig};
use action_audit::parser::{GitHubActionsParser, Parser as _};
use action_audit::patch::{PatchEngine, block};
use action_audit::version::remote::RemoteAuthority;
use action_audit::version::remotes::{GitHubRemote, OfflineRemote};
use action_audit::version::resolver::VersionResolver;

#[derive(Parser)]
#[command(name = "action-audit")]
#[command(version, about = "Audit version pins of GitHub Actions workflows")]
struct Cli {
    /// Also write logs to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report outdated, deprecated, insecure and relocated actions
    Scan(ScanArgs),
    /// Preview the `with:` changes needed for an upgrade
    Patch(PatchArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// Workflow or action files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Compare versions as plain strings without calling the GitHub API
    #[arg(long)]
    offline: bool,

    /// Only analyze reusable workflows and composite action steps
    #[arg(long)]
    composite_only: bool,

    /// Print issues as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct PatchArgs {
    /// Repository currently referenced (e.g. actions/checkout)
    repository: String,
    from: String,
    to: String,

    /// Repository the action moves to
    #[arg(long)]
    to_repository: Option<String>,

    /// Current `with:` input
    #[arg(long = "with", value_name = "KEY=VALUE")]
    with: Vec<String>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose)?;

    match cli.command {
        Command::Scan(args) => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(scan(args)),
        Command::Patch(args) => patch(args),
    }
}

fn init_tracing(verbose: bool) -> anyhow::Result<WorkerGuard> {
    let level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env("ACTION_AUDIT_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    let dir = config::data_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, config::LOG_FILE_NAME));

    let stderr = verbose.then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(guard)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AuditConfig> {
    match path {
        Some(path) => Ok(AuditConfig::load(path)?),
        None => Ok(AuditConfig::default()),
    }
}

async fn scan(args: ScanArgs) -> anyhow::Result<ExitCode> {
    let config = load_config(args.config.as_deref())?;

    let remote: Arc<dyn RemoteAuthority> = if args.offline {
        Arc::new(OfflineRemote)
    } else {
        let token = config
            .github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok());
        Arc::new(GitHubRemote::new(&config.github.base_url).with_token(token))
    };

    let analyzer = IssueAnalyzer::new(
        RuleSet::defaults().with_custom(config.rules),
        Arc::new(VersionResolver::new(remote, config.cache.ttl_ms)),
        Arc::new(PatchEngine::with_custom(config.patches)),
    )
    .composite_only(args.composite_only || config.analysis.composite_only);

    let mut references = Vec::new();
    for file in &args.files {
        let name = file.display().to_string();
        let parser = GitHubActionsParser::for_file(&name);
        if !parser.can_parse(&name) {
            warn!("{} is not under .github/ nor an action.yml; parsing anyway", name);
        }

        let content =
            std::fs::read_to_string(file).with_context(|| format!("failed to read {}", name))?;
        let found = parser
            .parse(&content)
            .with_context(|| format!("failed to parse {}", name))?;
        info!("{}: {} references", name, found.len());
        references.extend(found);
    }

    let issues = analyzer.analyze_actions(&references).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&issues)?);
    } else {
        for issue in &issues {
            print_issue(issue);
        }
    }

    Ok(if issues.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn print_issue(issue: &Issue) {
    println!(
        "{}: [{}] {} {}@{} -> {}",
        issue.location,
        issue.severity,
        issue.issue_type,
        issue.repository,
        issue.current_version,
        issue
            .migration_target
            .as_deref()
            .unwrap_or(&issue.suggested_version)
    );
    println!("    {}", issue.description);
    if let Some(changes) = &issue.schema_changes {
        println!("    inputs: {}", changes.summary());
    }
}

fn patch(args: PatchArgs) -> anyhow::Result<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    let engine = PatchEngine::with_custom(config.patches);

    let block = block::from_assignments(args.with.iter().map(String::as_str))?;
    let to_repository = args.to_repository.as_deref().unwrap_or(&args.repository);

    let patch = engine.preview_changes_with_location(
        &args.repository,
        &args.from,
        &args.to,
        to_repository,
        Some(&block),
    );
    println!("{}", serde_json::to_string_pretty(&patch)?);

    Ok(ExitCode::SUCCESS)
}
