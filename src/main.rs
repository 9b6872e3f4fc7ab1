use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pyproject_deps::config::{self, Config};
use pyproject_deps::parser::{LocatedDeclaration, PyprojectTomlParser};
use pyproject_deps::report::{
    CheckedDeclaration, DeclarationIndex, check_manifest, update_manifest,
};
use pyproject_deps::version::cache::MetadataCache;
use pyproject_deps::version::provider::MetadataProvider;
use pyproject_deps::version::registries::PypiRegistry;
use pyproject_deps::version::types::PackageMetadata;

#[derive(Parser)]
#[command(name = "pyproject-deps")]
#[command(version, about = "Check pyproject.toml dependencies against PyPI")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to a file instead of stderr (defaults to the data directory)
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify every declared dependency against its latest release
    Check {
        #[arg(default_value = "pyproject.toml")]
        path: PathBuf,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// List declared dependencies with their positions
    Locate {
        #[arg(default_value = "pyproject.toml")]
        path: PathBuf,

        /// Only show the declaration covering a 1-based position
        #[arg(long, value_name = "LINE:COL", value_parser = parse_position)]
        at: Option<(usize, usize)>,

        #[arg(long)]
        json: bool,
    },
    /// Show registry information for a package
    Info {
        package: String,

        #[arg(long)]
        json: bool,
    },
    /// Rewrite the version specifier of a declared package
    Update {
        package: String,

        #[arg(long, default_value = "pyproject.toml")]
        path: PathBuf,

        /// Stay within the currently declared major version
        #[arg(long)]
        same_major: bool,

        /// Print the updated manifest instead of writing it
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_file.as_ref())?;
    let config = Config::load(cli.config.as_deref())?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli.command, config))
}

/// Log to stderr, or to a file when requested; the guard must outlive the program
fn init_logging(log_file: Option<&Option<PathBuf>>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_file) = log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    let path = log_file.clone().unwrap_or_else(config::log_path);
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .with_context(|| format!("Invalid log file path {}", path.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();

    Ok(Some(guard))
}

fn parse_position(value: &str) -> Result<(usize, usize), String> {
    let (line, column) = value
        .split_once(':')
        .ok_or_else(|| format!("expected LINE:COL, got '{value}'"))?;
    let parse = |part: &str| match part.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("'{part}' is not a positive number")),
    };
    Ok((parse(line)?, parse(column)?))
}

fn build_provider(config: &Config) -> MetadataProvider {
    let registry = Arc::new(PypiRegistry::new(config.registry.url.clone()));
    let cache = Arc::new(MetadataCache::new(config.cache.ttl));
    MetadataProvider::with_cache(registry, cache, config.registry.timeout)
}

fn read_manifest(parser: &PyprojectTomlParser, path: &Path) -> anyhow::Result<String> {
    if !parser.can_parse(&path.to_string_lossy()) {
        warn!("{} is not named pyproject.toml", path.display());
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    let parser = PyprojectTomlParser::new();

    match command {
        Command::Check { path, json } => {
            let content = read_manifest(&parser, &path)?;
            let provider = build_provider(&config);
            let results = check_manifest(&parser, &provider, &content).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for result in &results {
                    println!("{}", format_checked(&path, result));
                }
            }
        }
        Command::Locate { path, at, json } => {
            let content = read_manifest(&parser, &path)?;
            let mut declarations = parser.parse(&content);
            if let Some((line, column)) = at {
                let found = DeclarationIndex::new(&declarations)
                    .find_at_position(line - 1, column - 1)
                    .cloned();
                declarations = found.into_iter().collect();
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&declarations)?);
            } else {
                for declaration in &declarations {
                    println!("{}", format_declaration(&path, declaration));
                }
            }
        }
        Command::Info { package, json } => {
            let provider = build_provider(&config);
            let Some(metadata) = provider.fetch_metadata(&package).await else {
                bail!("No metadata available for {}", package);
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&metadata)?);
            } else {
                print!("{}", format_metadata(&metadata));
            }
        }
        Command::Update {
            package,
            path,
            same_major,
            dry_run,
        } => {
            let content = read_manifest(&parser, &path)?;
            let provider = build_provider(&config);
            let updated =
                update_manifest(&parser, &provider, &content, &package, same_major).await?;
            if dry_run {
                print!("{updated}");
            } else {
                std::fs::write(&path, updated)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Updated {} in {}", package, path.display());
            }
        }
    }

    Ok(())
}

fn format_declaration(path: &Path, declaration: &LocatedDeclaration) -> String {
    format!(
        "{}:{}:{} {} {} [{}]",
        path.display(),
        declaration.line + 1,
        declaration.name_start_col + 1,
        declaration.name,
        declaration.version_spec,
        declaration.dialect.as_str()
    )
}

fn format_checked(path: &Path, checked: &CheckedDeclaration) -> String {
    let detail = match (&checked.status, &checked.annotation) {
        (None, _) => "? metadata unavailable".to_string(),
        (Some(_), Some(annotation)) => annotation.text.clone(),
        (Some(_), None) => "✓ up to date".to_string(),
    };
    format!("{} {}", format_declaration(path, &checked.declaration), detail)
}

fn format_metadata(metadata: &PackageMetadata) -> String {
    let mut out = format!("{}\n", metadata.name);
    if !metadata.summary.is_empty() {
        out.push_str(&format!("{}\n", metadata.summary));
    }
    out.push_str(&format!("Latest: {}\n", metadata.latest_stable));
    if let Some(prerelease) = &metadata.latest_prerelease {
        out.push_str(&format!("Prerelease: {prerelease}\n"));
    }
    for (label, url) in [
        ("Homepage", &metadata.home_page),
        ("Docs", &metadata.documentation_url),
        ("Changelog", &metadata.changelog_url),
    ] {
        if let Some(url) = url {
            out.push_str(&format!("{label}: {url}\n"));
        }
    }
    out
}
