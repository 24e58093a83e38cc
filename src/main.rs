//! endpoint-redirect CLI
//!
//! Inspect what the redirector would do for a service descriptor.
//!
//! ```text
//! service.toml ──▶ config resolver ──▶ activation decision ──▶ endpoint map ──▶ stdout (JSON)
//!      ▲                 ▲
//!  --service      --stage / --option key=value
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use endpoint_redirect::config::{
    load_service_file, CliOptions, ConfigResolver, ProcessEnv, Resolution,
};
use endpoint_redirect::endpoints::{PortTable, DEFAULT_EDGE_PORT};
use endpoint_redirect::lifecycle::local_endpoints;
use endpoint_redirect::net::HostnameResolver;
use endpoint_redirect::observability::init_logging;

#[derive(Parser)]
#[command(name = "endpoint-redirect")]
#[command(about = "Resolve local endpoint redirection for a service", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve configuration and print the endpoint map
    Resolve {
        /// Service descriptor (TOML)
        #[arg(short, long)]
        service: PathBuf,

        /// Deployment stage
        #[arg(long)]
        stage: Option<String>,

        /// Extra option overlaid on the plugin block (key=value)
        #[arg(short, long = "option", value_parser = parse_option)]
        options: Vec<(String, Value)>,
    },
    /// Print the compiled-in service port table
    Endpoints {
        /// Print edge ports instead of per-service ports
        #[arg(long)]
        edge: bool,
    },
}

/// `key=value`; the value is read as JSON when it parses, else as a string.
fn parse_option(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let logging = init_logging(cli.debug);

    let output = match cli.command {
        Commands::Resolve {
            service,
            stage,
            options,
        } => {
            let descriptor = load_service_file(&service)?;
            let mut cli_options = CliOptions {
                stage,
                ..Default::default()
            };
            for (key, value) in options {
                cli_options = cli_options.option(key, value);
            }

            let resolver = ConfigResolver::new(Arc::new(descriptor), cli_options);
            tracing::debug!(service = %service.display(), "Resolving configuration");

            match resolver.resolve().await? {
                Resolution::Deferred { endpoint_file } => json!({
                    "stage": resolver.effective_stage(),
                    "deferred": true,
                    "endpointFile": endpoint_file,
                }),
                Resolution::Ready(config) => {
                    logging.set_debug(cli.debug || config.debug);
                    let active = resolver.is_active(&config);
                    let endpoints = if active {
                        let hostnames = HostnameResolver::default();
                        serde_json::to_value(
                            local_endpoints(&config, &ProcessEnv, &hostnames).await,
                        )?
                    } else {
                        json!({})
                    };
                    json!({
                        "stage": config.stage,
                        "active": active,
                        "config": config,
                        "endpoints": endpoints,
                    })
                }
            }
        }
        Commands::Endpoints { edge } => {
            let table = if edge {
                PortTable::Edge(DEFAULT_EDGE_PORT)
            } else {
                PortTable::Legacy
            };
            let ports: serde_json::Map<String, Value> = PortTable::services()
                .filter_map(|name| table.port_for(name).map(|port| (name.to_string(), json!(port))))
                .collect();
            Value::Object(ports)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_option() {
        assert_eq!(
            parse_option("edgePort=4566").unwrap(),
            ("edgePort".to_string(), json!(4566))
        );
        assert_eq!(
            parse_option("host=http://localhost").unwrap(),
            ("host".to_string(), json!("http://localhost"))
        );
        assert!(parse_option("nope").is_err());
    }
}
