//! `dockside` application entry point.
//!
//! Uses `eyre` for opaque error handling at the application boundary,
//! converting domain-specific errors into human-readable reports.
//!
//! Configuration is loaded with layered precedence via `OrthoConfig`:
//! 1. Application defaults
//! 2. Configuration file (`~/.config/dockside/config.toml` or path from `DOCKSIDE_CONFIG_PATH`)
//! 3. Environment variables (`DOCKSIDE_*`)
//! 4. Command-line arguments

use std::time::Duration;

use clap::Parser;
use dockside::api::{self, WaitParams};
use dockside::config::{AppConfig, Cli, Commands, load_config};
use dockside::engine::{ContainerSnapshot, DockerCli, Inventory};
use dockside::error::Result as DocksideResult;
use dockside::logging::init_logging;
use eyre::{Report, Result as EyreResult, WrapErr};
use mockable::DefaultEnv;
use tokio::runtime::Runtime;

fn main() -> EyreResult<()> {
    let cli = Cli::parse();
    let env = DefaultEnv::new();

    init_logging(cli.log_level, &env).map_err(Report::msg)?;

    // defaults < file < env < CLI
    let config = load_config(&cli).map_err(Report::from)?;

    let runtime = Runtime::new().wrap_err("failed to start the async runtime")?;
    let client = api::connect(&config, &env);

    run(&cli, &config, &client, &runtime).map_err(Report::from)
}

/// Execute the CLI command, returning domain-specific errors.
fn run(cli: &Cli, config: &AppConfig, client: &DockerCli, runtime: &Runtime) -> DocksideResult<()> {
    let handle = runtime.handle();
    match &cli.command {
        Commands::Inspect(args) => {
            print_snapshot(&api::inspect(client, handle, &args.container)?);
        }
        Commands::Wait(args) => {
            let snapshot = api::wait_for_status(WaitParams {
                client,
                runtime_handle: handle,
                container: &args.container,
                target: args.status,
                timeout: timeout_or_default(args.timeout_secs, config),
            })?;
            print_snapshot(&snapshot);
        }
        Commands::Inventory(args) => {
            print_inventory(&api::inventory(client, handle, &args.filters)?);
        }
        Commands::WaitManager(args) => {
            let info = api::wait_for_swarm_manager(
                client,
                handle,
                timeout_or_default(args.timeout_secs, config),
            )?;
            print_line(&format!("manager {}", info.node_id));
        }
    }
    Ok(())
}

fn timeout_or_default(timeout_secs: Option<u64>, config: &AppConfig) -> Duration {
    timeout_secs.map_or_else(|| config.wait_timeout(), Duration::from_secs)
}

fn print_snapshot(snapshot: &ContainerSnapshot) {
    print_line(&format!(
        "{}\t{}\t{}\texit={}",
        snapshot.id, snapshot.name, snapshot.status, snapshot.exit_code
    ));
}

fn print_inventory(inventory: &Inventory) {
    for item in inventory.iter() {
        print_line(&format!("{}\t{}\t{}", item.kind.command(), item.id, item.name));
    }
}

#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn print_line(line: &str) {
    println!("{line}");
}
