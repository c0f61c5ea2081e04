use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};
use tagscout::{
    config::CliOverrides,
    ingest::load_tree,
    search::search_with,
    server, traversal,
    words::count_words_in_file,
    CancelSignal, SearchOutcome, TagScoutConfig, TagScoutError,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG wins when set
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TreeArgs {
    /// JSON file holding the tree
    #[arg(short, long)]
    input: Option<PathBuf>,
}

#[derive(Args)]
struct TuningArgs {
    /// Worker threads per search
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Child count at which children are searched in parallel
    #[arg(long)]
    fan_out: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every node name in pre-order
    Walk(TreeArgs),

    /// Print every root-to-leaf path
    Paths(TreeArgs),

    /// Find the first node with the given name and print its subtree
    Search {
        /// Name to look for
        #[arg(short, long)]
        tag: String,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        #[command(flatten)]
        tree: TreeArgs,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Serve the tag API until Ctrl+C
    Serve {
        #[command(flatten)]
        tree: TreeArgs,

        /// Address to bind
        #[arg(short, long)]
        bind: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Count word occurrences in a text file
    CountWords {
        /// File to read
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let file_config = TagScoutConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Walk(tree) => {
            let config = file_config.merge_with_cli(overrides(cli.log_level, tree, None), false);
            init_logging(&config.log_level);

            let root = load_tree(&config.graph_path)?;
            for node in traversal::walk(Some(&root)) {
                println!("{}", tagscout::TreeNode::name(node));
            }
            Ok(())
        }
        Commands::Paths(tree) => {
            let config = file_config.merge_with_cli(overrides(cli.log_level, tree, None), false);
            init_logging(&config.log_level);

            let root = load_tree(&config.graph_path)?;
            let paths = traversal::paths(Some(&root));
            println!("{}", traversal::format_paths(&paths));
            Ok(())
        }
        Commands::Search {
            tag,
            timeout,
            tree,
            tuning,
        } => {
            let config =
                file_config.merge_with_cli(overrides(cli.log_level, tree, Some(tuning)), false);
            init_logging(&config.log_level);

            if tag.is_empty() {
                return Err(TagScoutError::invalid_argument("tag must not be empty").into());
            }

            let root = load_tree(&config.graph_path)?;
            debug!("Searching {} nodes for '{}'", root.size(), tag);
            let signal = CancelSignal::new();
            if let Some(secs) = timeout {
                signal.cancel_after(Duration::from_secs(secs));
            }

            let start = Instant::now();
            let outcome = search_with(&config.search_options(), &signal, Some(&root), &tag);
            let elapsed = humantime::format_duration(truncate_to_micros(start.elapsed()));

            match outcome {
                SearchOutcome::Found(node) => {
                    println!("{}", serde_json::to_string_pretty(node)?);
                    eprintln!("{} in {}", "Found".green(), elapsed);
                    Ok(())
                }
                SearchOutcome::NotFound if signal.is_cancelled() => {
                    bail!("Search for tag {} timed out after {}", tag, elapsed)
                }
                SearchOutcome::NotFound => bail!("Tag {} was not found", tag),
            }
        }
        Commands::Serve {
            tree,
            bind,
            port,
            tuning,
        } => {
            let mut cli_overrides = overrides(cli.log_level, tree, Some(tuning));
            cli_overrides.bind = bind;
            cli_overrides.port = port;
            let config = file_config.merge_with_cli(cli_overrides, true);
            init_logging(&config.log_level);

            let root = load_tree(&config.tags_path)?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads((num_cpus::get() / 2).max(1))
                .enable_all()
                .build()?;

            println!(
                "Server started on {}",
                humantime::format_rfc3339_seconds(SystemTime::now())
            );
            let result = runtime.block_on(server::serve(&config, root));
            println!(
                "Server stopped on {}",
                humantime::format_rfc3339_seconds(SystemTime::now())
            );
            result?;
            Ok(())
        }
        Commands::CountWords { path } => {
            init_logging(cli.log_level.as_deref().unwrap_or(&file_config.log_level));

            for entry in count_words_in_file(&path)? {
                println!("{} {}", entry.count, entry.word);
            }
            Ok(())
        }
    }
}

fn overrides(log_level: Option<String>, tree: TreeArgs, tuning: Option<TuningArgs>) -> CliOverrides {
    let (pool_capacity, fan_out_threshold) = match tuning {
        Some(tuning) => (tuning.threads, tuning.fan_out),
        None => (None, None),
    };
    CliOverrides {
        input: tree.input,
        pool_capacity,
        fan_out_threshold,
        log_level,
        ..Default::default()
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn truncate_to_micros(elapsed: Duration) -> Duration {
    Duration::from_micros(elapsed.as_micros() as u64)
}
