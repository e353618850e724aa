use clap::{Parser, Subcommand};
use smartbear_mcp::config::{
    LogFormat, ProcessEnv, ResolvedCredentials, Settings, SettingsOverrides,
};
use smartbear_mcp::core::{bootstrap, Product};
use smartbear_mcp::transport::{ConnectOutcome, HttpTransport, StdioTransport, TransportConnector};
use smartbear_mcp::utils::{crash_reporting, init_tracing, McpError};
use std::net::SocketAddr;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "smartbear-mcp")]
#[command(about = "MCP server for SmartBear products")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Configuration file path
    #[arg(short, long, global = true, env = "MCP_SERVER_CONFIG")]
    config: Option<String>,

    /// Address for the streamable HTTP transport, e.g. 127.0.0.1:3000
    #[arg(long, global = true)]
    http_addr: Option<SocketAddr>,

    /// Log level or filter directive
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    /// Start the MCP server (default)
    Serve,
    /// Show which products are configured, then exit
    Check,
}

impl Cli {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            http_addr: self.http_addr,
            log_level: self.log_level.clone(),
            log_format: self.log_format,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref(), &cli.overrides()) {
        Ok(settings) => settings,
        Err(e) => fatal(e),
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(settings).await,
        Command::Check => check(),
    }
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = init_tracing(&settings.log) {
        fatal(e);
    }
    if crash_reporting::init(settings.crash_reporting.api_key.as_deref()) {
        info!("Crash reporting enabled");
    }

    let credentials = ResolvedCredentials::resolve(&ProcessEnv);
    credentials.log_diagnostics();

    let service = match bootstrap(&credentials).await {
        Ok(service) => service,
        Err(e) => {
            error!("{}", e);
            crash_reporting::notify(&e);
            std::process::exit(e.exit_code());
        }
    };

    let connector = TransportConnector::new(
        Box::new(HttpTransport::new(settings.http.clone())),
        Box::new(StdioTransport::new()),
    );

    match connector.connect(service).await {
        ConnectOutcome::Connected { via, mut session, .. } => {
            if let Err(e) = session.serve().await {
                error!(transport = %via, error = %e, "Transport session ended with an error");
                crash_reporting::notify(&e);
            }
        }
        ConnectOutcome::Failed(failure) => {
            // Left to the host to notice and restart.
            error!(
                primary = %failure.primary,
                fallback = %failure.fallback,
                "Failed to start any transport"
            );
            crash_reporting::notify(&failure);
        }
    }

    Ok(())
}

fn check() -> anyhow::Result<()> {
    let credentials = ResolvedCredentials::resolve(&ProcessEnv);

    for product in Product::ALL {
        let status = if credentials.is_enabled(product) {
            "enabled"
        } else {
            "not configured"
        };
        println!("{:<14} {}", product.display_name(), status);
    }
    for diagnostic in &credentials.diagnostics {
        println!("warning: {}", diagnostic);
    }

    if credentials.enabled().is_empty() {
        let e = McpError::NoIntegrations;
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
    Ok(())
}

fn fatal(e: McpError) -> ! {
    eprintln!("Error: {}", e);
    std::process::exit(e.exit_code())
}
