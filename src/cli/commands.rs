use crate::demo::{demo_registry, demo_routes};
use crate::dispatcher::Dispatcher;
use crate::registry::HandlerRegistry;
use crate::route::{load_manifest, RouteDescriptor};
use crate::router::RouteTable;
use crate::runtime_config::RuntimeConfig;
use crate::server::{AppService, DispatchService, HttpServer, ServerHandle};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Command-line interface for laneway
#[derive(Parser)]
#[command(name = "laneway")]
#[command(about = "Declarative-route HTTP dispatch with IO and CPU lanes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that builds a route table.
#[derive(Args, Debug, Clone, Default)]
pub struct RouteSource {
    /// Route manifest (YAML) resolved against the demo handlers
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the demo controller until SIGINT/SIGTERM
    Serve {
        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Bind host (overrides config and LANEWAY_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config and LANEWAY_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// CPU lane worker threads (overrides config and LANEWAY_CPU_WORKERS)
        #[arg(long)]
        cpu_workers: Option<usize>,

        #[command(flatten)]
        routes: RouteSource,
    },
    /// Print the resolved route table
    Routes {
        #[command(flatten)]
        routes: RouteSource,
    },
}

/// Resolve either the given manifest or the built-in demo manifest.
pub fn resolve_routes(manifest: Option<&Path>, registry: &HandlerRegistry) -> Result<Vec<RouteDescriptor>> {
    match manifest {
        Some(path) => load_manifest(path)
            .and_then(|m| m.resolve(registry))
            .with_context(|| format!("failed to load route manifest {}", path.display())),
        None => demo_routes(registry).context("built-in demo manifest is invalid"),
    }
}

/// Build the table, lanes and listener described by `config`.
pub fn start_server(config: &RuntimeConfig, registry: &HandlerRegistry) -> Result<ServerHandle> {
    let descriptors = resolve_routes(config.manifest.as_deref(), registry)?;
    let table = Arc::new(RouteTable::from_descriptors(descriptors)?);
    let dispatcher =
        Arc::new(Dispatcher::new(config.lane_config()).context("failed to start execution lanes")?);

    may::config().set_stack_size(config.stack_size);

    let service = AppService::new(DispatchService::with_json(table, dispatcher))
        .with_request_timeout(config.request_timeout());
    let handle = HttpServer(service)
        .start(config.bind_addr())
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
    handle.wait_ready().context("server did not become ready")?;
    Ok(handle)
}

#[cfg(unix)]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("failed to install signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal = signal, "Shutdown signal received");
    }
    handle.stop();
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server thread panicked: {e:?}"))
}

pub fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            cpu_workers,
            routes,
        } => {
            let mut runtime = RuntimeConfig::load(config.as_deref())?
                .with_overrides(host, port, cpu_workers)
                .normalized();
            if routes.manifest.is_some() {
                runtime.manifest = routes.manifest;
            }
            info!(
                addr = %runtime.bind_addr(),
                cpu_workers = runtime.cpu_workers,
                stack_size = runtime.stack_size,
                manifest = ?runtime.manifest,
                "Starting laneway"
            );

            let registry = demo_registry();
            let handle = start_server(&runtime, &registry)?;
            println!("laneway listening on http://{}", handle.addr());
            wait_for_shutdown(handle)
        }
        Commands::Routes { routes } => {
            let registry = demo_registry();
            let table = RouteTable::from_descriptors(resolve_routes(routes.manifest.as_deref(), &registry)?)?;
            table.dump_routes();
            Ok(())
        }
    }
}
