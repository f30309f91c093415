//! # FISSION Node
//!
//! Entry point for the `fission-node` binary. Parses CLI arguments,
//! initializes logging and metrics, deploys the in-memory redemption
//! engine, and serves the HTTP API.
//!
//! The binary supports five subcommands:
//!
//! - `run`     — start the redemption engine
//! - `init`    — initialize data directory and generate an issuer keypair
//! - `voucher` — sign a redemption voucher off-line
//! - `status`  — query a running node's status endpoint
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::RwLock;

use fission_contracts::voucher::{NftReference, SigningDomain, Voucher};
use fission_contracts::warhead::WarheadContract;
use fission_protocol::crypto::{Address, IssuerKeypair};

use cli::{Commands, FissionNodeCli};
use logging::LogFormat;
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = FissionNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Init(args) => init_node(args),
        Commands::Voucher(args) => sign_voucher(args),
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the full engine: API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "fission_node=info,fission_contracts=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        chain_id = args.chain_id,
        data_dir = %args.data_dir.display(),
        "starting fission-node"
    );

    // --- Issuer key ---
    let issuer = load_issuer_key(&args)?;
    tracing::info!(issuer = %issuer.address(), "issuer key loaded");

    // --- Deployment parameters ---
    let contract_address: Address = args
        .contract_address
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid contract address: {}", e))?;
    let administrator: Address = args
        .administrator
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid administrator address: {}", e))?;

    // --- Engine ---
    let contract = WarheadContract::new(
        contract_address,
        args.chain_id,
        issuer.address(),
        administrator,
    )
    .map_err(|e| anyhow::anyhow!("failed to deploy engine: {}", e))?;
    tracing::info!(
        contract = %contract.address(),
        max_supply = contract.max_supply(),
        "engine deployed"
    );

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new());

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            fission_protocol::config::PROTOCOL_VERSION,
        ),
        contract: Arc::new(RwLock::new(contract)),
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state.clone());
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("fission-node stopped");
    Ok(())
}

/// Loads the issuer key from the `--issuer-key` flag or, failing that, from
/// `issuer.key` in the data directory.
fn load_issuer_key(args: &cli::RunArgs) -> Result<IssuerKeypair> {
    let hex_key = match &args.issuer_key {
        Some(k) => k.clone(),
        None => {
            let key_path = args.data_dir.join("issuer.key");
            std::fs::read_to_string(&key_path)
                .with_context(|| {
                    format!(
                        "failed to read issuer key from {} (run `fission-node init` first)",
                        key_path.display()
                    )
                })?
                .trim()
                .to_string()
        }
    };
    IssuerKeypair::from_hex(&hex_key).map_err(|e| anyhow::anyhow!("invalid issuer key: {}", e))
}

/// Initializes a new node data directory and generates an issuer keypair.
fn init_node(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("fission_node=info", LogFormat::Pretty);

    let data_dir = &args.data_dir;
    tracing::info!(data_dir = %data_dir.display(), "initializing node");

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    // Generate the issuer keypair.
    let keypair = IssuerKeypair::generate();
    let issuer_address = keypair.address();

    // Write the secret key to a file inside the data directory.
    let key_path = data_dir.join("issuer.key");
    std::fs::write(&key_path, keypair.secret_hex())
        .with_context(|| format!("failed to write issuer key to {}", key_path.display()))?;

    // Restrict permissions on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&key_path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::info!(
        issuer = %issuer_address,
        key_path = %key_path.display(),
        "issuer keypair generated"
    );

    println!("Node initialized successfully.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Issuer key     : {}", key_path.display());
    println!("  Issuer address : {}", issuer_address);

    Ok(())
}

/// Signs a redemption voucher off-line and prints it to stdout as JSON.
///
/// This is the issuance tool: vouchers produced here can be redeemed
/// against any node whose chain id and contract address match the given
/// signing domain.
fn sign_voucher(args: cli::VoucherArgs) -> Result<()> {
    let hex_key = std::fs::read_to_string(&args.key_file)
        .with_context(|| format!("failed to read issuer key from {}", args.key_file.display()))?;
    let issuer = IssuerKeypair::from_hex(hex_key.trim())
        .map_err(|e| anyhow::anyhow!("invalid issuer key: {}", e))?;

    let parent_contract: Address = args
        .parent_contract
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid parent contract address: {}", e))?;
    let owner: Address = args
        .owner
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid owner address: {}", e))?;
    let contract_address: Address = args
        .contract_address
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid contract address: {}", e))?;

    let domain = SigningDomain::for_deployment(args.chain_id, contract_address);
    let voucher = Voucher::new_signed(
        args.uri,
        NftReference {
            chain_id: args.parent_chain_id,
            contract_address: parent_contract,
            token_id: args.parent_token_id,
        },
        owner,
        &domain,
        &issuer,
    );

    println!("{}", serde_json::to_string_pretty(&voucher)?);
    Ok(())
}

/// Queries a running node's status endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/status", args.rpc_url.trim_end_matches('/'));
    let body = http_get(&url).await?;
    println!("{}", body);
    Ok(())
}

/// Minimal HTTP/1.1 GET without pulling in a full client crate — the
/// status subcommand only ever talks plain HTTP to localhost.
async fn http_get(url: &str) -> Result<String> {
    let rest = url
        .strip_prefix("http://")
        .ok_or_else(|| anyhow::anyhow!("only http:// URLs are supported, got {}", url))?;
    let (authority, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };
    let addr = if authority.contains(':') {
        authority.to_string()
    } else {
        format!("{}:80", authority)
    };

    let mut stream = tokio::net::TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, authority,
    );

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    stream.write_all(request.as_bytes()).await?;
    stream.shutdown().await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    let response = String::from_utf8_lossy(&buf);

    // Everything after the first blank line is the body.
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_else(|| response.to_string());

    Ok(body)
}

/// Prints version information to stdout.
fn print_version() {
    println!("fission-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol     {}", fission_protocol::config::PROTOCOL_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
