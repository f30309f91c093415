//! # CLI Interface
//!
//! Defines the command-line argument structure for `fission-node` using
//! `clap` derive. Supports five subcommands: `run`, `init`, `voucher`,
//! `status`, and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fission_protocol::config::{DEFAULT_METRICS_PORT, DEFAULT_RPC_PORT, DEV_CHAIN_ID};

/// FISSION redemption engine node.
///
/// Runs the warhead redemption engine as a single-process service: accepts
/// signed vouchers over HTTP, mints warheads, tracks provenance, and
/// exposes Prometheus metrics. Also doubles as the off-line issuance tool
/// via the `voucher` subcommand.
#[derive(Parser, Debug)]
#[command(
    name = "fission-node",
    about = "FISSION redemption engine node",
    version,
    propagate_version = true
)]
pub struct FissionNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the FISSION node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the redemption engine.
    Run(RunArgs),
    /// Initialize a new node — creates the data directory and generates
    /// a fresh issuer keypair.
    Init(InitArgs),
    /// Sign a redemption voucher off-line with an issuer key and print it
    /// as JSON.
    Voucher(VoucherArgs),
    /// Query the status of a running node via its RPC endpoint.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the node data directory where the issuer key is stored.
    ///
    /// Created by `init`; the engine reads `issuer.key` from here unless
    /// `--issuer-key` is given.
    #[arg(long, short = 'd', env = "FISSION_DATA_DIR", default_value = "~/.fission")]
    pub data_dir: PathBuf,

    /// Port for the REST API.
    #[arg(long, env = "FISSION_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "FISSION_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "FISSION_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Chain id the engine considers its own deployment chain.
    #[arg(long, env = "FISSION_CHAIN_ID", default_value_t = DEV_CHAIN_ID)]
    pub chain_id: u64,

    /// 0x-hex address the engine is considered deployed at. Part of the
    /// voucher signing domain, so issuance tooling must use the same value.
    #[arg(
        long,
        env = "FISSION_CONTRACT_ADDRESS",
        default_value = "0x00000000000000000000000000000000f1551011"
    )]
    pub contract_address: String,

    /// 0x-hex address of the initial administrator.
    #[arg(long, env = "FISSION_ADMINISTRATOR")]
    pub administrator: String,

    /// Hex-encoded secp256k1 issuer private key.
    ///
    /// If not provided, the node reads the key from the data directory.
    /// **Never pass this flag in production** — use a key file instead.
    #[arg(long, env = "FISSION_ISSUER_KEY")]
    pub issuer_key: Option<String>,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Path to the data directory to initialize.
    #[arg(long, short = 'd', env = "FISSION_DATA_DIR", default_value = "~/.fission")]
    pub data_dir: PathBuf,
}

/// Arguments for the `voucher` subcommand.
#[derive(Parser, Debug)]
pub struct VoucherArgs {
    /// Path to the hex-encoded issuer key file.
    #[arg(long, env = "FISSION_ISSUER_KEY_FILE")]
    pub key_file: PathBuf,

    /// Metadata URI for the warhead to be minted.
    #[arg(long)]
    pub uri: String,

    /// Chain id of the parent NFT.
    #[arg(long)]
    pub parent_chain_id: u64,

    /// 0x-hex contract address of the parent NFT's collection.
    #[arg(long)]
    pub parent_contract: String,

    /// Token id of the parent NFT.
    #[arg(long)]
    pub parent_token_id: u64,

    /// 0x-hex address asserted as the parent NFT's owner. Only this address
    /// will be able to redeem the voucher.
    #[arg(long)]
    pub owner: String,

    /// Chain id of the target deployment (signing domain).
    #[arg(long, default_value_t = DEV_CHAIN_ID)]
    pub chain_id: u64,

    /// 0x-hex address of the target deployment (signing domain).
    #[arg(
        long,
        default_value = "0x00000000000000000000000000000000f1551011"
    )]
    pub contract_address: String,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// RPC endpoint of the running node.
    #[arg(long, default_value = "http://127.0.0.1:8560")]
    pub rpc_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        FissionNodeCli::command().debug_assert();
    }
}
