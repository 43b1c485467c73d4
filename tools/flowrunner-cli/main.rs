use ahash::AHashSet;
use clap::{Parser, Subcommand};
use flowrunner::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Runs flow documents against the built-in action set
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a flow JSON file once
    Run {
        /// Path to the flow JSON file
        flow_path: String,

        /// Optional executor config JSON file
        #[arg(short, long)]
        config: Option<String>,

        /// Fail on cyclic edges instead of falling back to declaration order
        #[arg(long)]
        strict_cycles: bool,
    },
    /// Print the registered actions as JSON
    Catalog {
        /// Restrict the listing to these action ids
        #[arg(long, value_delimiter = ',')]
        allowlist: Option<Vec<String>>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let registry = Arc::new(ActionRegistry::with_builtin_modules());
    registry.discover_all();

    match cli.command {
        Command::Run {
            flow_path,
            config,
            strict_cycles,
        } => run_flow(registry, &flow_path, config.as_deref(), strict_cycles),
        Command::Catalog { allowlist } => print_catalog(&registry, allowlist),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_flow(
    registry: Arc<ActionRegistry>,
    flow_path: &str,
    config_path: Option<&str>,
    strict_cycles: bool,
) {
    let flow = Flow::from_file(flow_path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load flow: {}", e)));

    let mut config = match config_path {
        Some(path) => ExecutorConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => ExecutorConfig::default(),
    };
    if strict_cycles {
        config.cycle_policy = CyclePolicy::Reject;
    }

    println!(
        "Running flow '{}' ({} steps, {} edges)",
        flow_path,
        flow.steps.len(),
        flow.edges.len()
    );

    let executor = FlowExecutor::builder(registry)
        .with_config(config)
        .with_notifier(print_notification)
        .build();

    let start = Instant::now();
    let result = executor.execute(&flow);
    let duration = start.elapsed();

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with_error(&format!("Failed to serialize result: {}", e)),
    }
    println!("Finished in {:?} ({:?})", duration, result.state);

    if !result.ok {
        std::process::exit(1);
    }
}

fn print_notification(event: &Notification) {
    let step = if event.step_id.is_empty() {
        "flow"
    } else {
        event.step_id.as_str()
    };
    println!("  [{:<7}] {}: {}", event.level, step, event.message);
    if let Some(preview) = &event.preview {
        for (name, value) in preview {
            println!("            {} = {}", name, value);
        }
    }
}

fn print_catalog(registry: &ActionRegistry, allowlist: Option<Vec<String>>) {
    let allowed: Option<AHashSet<String>> = allowlist.map(|ids| ids.into_iter().collect());
    let enabled = registry.list_enabled(allowed.as_ref());
    let catalog: Vec<ActionDescriptor> = registry
        .catalog()
        .into_iter()
        .filter(|descriptor| enabled.contains(&descriptor.id))
        .collect();

    match serde_json::to_string_pretty(&catalog) {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with_error(&format!("Failed to serialize catalog: {}", e)),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
