use clap::{Parser, Subcommand};
use openapiv3::OpenAPI;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use openapi_bridge::config::{load_config, BridgeConfig};
use openapi_bridge::observability::{init_logging, metrics};
use openapi_bridge::{BridgeBuilder, CallArguments, CancelHandle, ComponentSet};

#[derive(Parser)]
#[command(name = "openapi-bridge")]
#[command(about = "Expose an OpenAPI-described HTTP API as callable components", long_about = None)]
struct Cli {
    /// OpenAPI document (JSON or YAML).
    #[arg(short, long)]
    spec: PathBuf,

    /// Bridge configuration (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `upstream.base_url`.
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every component with its kind, URI and input schema
    List,
    /// Invoke an action or prompt
    Call {
        name: String,
        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Read a resource or resource template URI
    Read { uri: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(base_url) = cli.base_url {
        config.upstream.base_url = Some(base_url);
    }

    if let Err(e) = init_logging(&config.observability.log_level) {
        eprintln!("logging already initialized: {e}");
    }
    if config.observability.metrics_enabled {
        metrics::describe_metrics();
    }

    tracing::info!("openapi-bridge v{} starting", env!("CARGO_PKG_VERSION"));

    let spec = load_spec(&cli.spec)?;
    let components = BridgeBuilder::from_config(&config)?.build(&spec)?;

    let output = match cli.command {
        Commands::List => list(&components),
        Commands::Call { name, args } => {
            let args = CallArguments::from_json(serde_json::from_str(&args)?)?;
            let (handle, signal) = CancelHandle::pair();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupt received, cancelling");
                    handle.cancel();
                }
            });
            components.invoke_cancellable(&name, args, signal).await?.to_json()
        }
        Commands::Read { uri } => components.read(&uri).await?.to_json(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_spec(path: &Path) -> Result<OpenAPI, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let spec = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        match serde_json::from_str(&content) {
            Ok(spec) => spec,
            Err(_) => serde_yaml::from_str(&content)?,
        }
    };
    Ok(spec)
}

fn list(components: &ComponentSet) -> Value {
    Value::Array(
        components
            .iter()
            .map(|c| {
                json!({
                    "name": c.name,
                    "kind": c.kind,
                    "route": c.descriptor.to_string(),
                    "description": c.description,
                    "uri": c.uri,
                    "tags": c.tags,
                    "input_schema": c.input_schema,
                })
            })
            .collect(),
    )
}
