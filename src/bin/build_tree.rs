use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{info, warn};
use std::collections::HashSet;
use std::path::PathBuf;
use zkp_airdrop_verifier::{
    config::Config,
    ethereum::{address_to_field, parse_address, read_accounts_file},
    utils::{field_to_hex, sanitize_for_log},
    MerklePathOutput, MerkleTree, Secret,
};

/// Environment variable holding the claimant's hex secret.
const SECRET_ENV: &str = "ZKP_SECRET";

#[derive(Parser, Debug)]
#[command(author, version, about = "Build the eligibility tree and export membership paths", long_about = None)]
struct Args {
    /// One address per line; falls back to `accounts.default_file`
    #[arg(short, long)]
    accounts_file: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Export the membership path of this address
    #[arg(long)]
    address: Option<String>,

    /// Where to write the membership path (stdout if omitted)
    #[arg(short, long, requires = "address")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    let accounts_file = args
        .accounts_file
        .or(config.accounts.default_file)
        .ok_or_else(|| anyhow!("No accounts file given and accounts.default_file is unset"))?;

    println!("Loading accounts from: {}", accounts_file.display());
    let addresses = read_accounts_file(&accounts_file, config.accounts.max_file_size)?;
    if addresses.is_empty() {
        return Err(anyhow!(
            "No valid addresses found in accounts file '{}'",
            accounts_file.display()
        ));
    }

    let unique: HashSet<_> = addresses.iter().collect();
    if unique.len() != addresses.len() {
        warn!(
            "Accounts file contains {} duplicate addresses",
            addresses.len() - unique.len()
        );
    }
    println!("Loaded {} addresses", addresses.len());

    let tree = MerkleTree::from_addresses(&addresses)?;
    println!("Merkle root: {}", field_to_hex(&tree.root()));

    if let Ok(secret_hex) = std::env::var(SECRET_ENV) {
        let secret = Secret::from_hex(&secret_hex)
            .with_context(|| format!("Invalid secret in {}", SECRET_ENV))?;
        let nullifier = field_to_hex(&secret.nullifier()?);
        info!("Nullifier: {}", sanitize_for_log(&nullifier));
        println!("Nullifier: {}", nullifier);
    }

    let Some(address) = args.address else {
        return Ok(());
    };
    let recipient = parse_address(&address)?;
    let leaf = zkp_airdrop_verifier::leaf_hash(address_to_field(&recipient))?;
    let index = tree
        .position(&leaf)
        .ok_or_else(|| anyhow!("Address {} is not in the accounts file", address))?;
    let proof = tree
        .generate_proof(index)
        .ok_or_else(|| anyhow!("Failed to generate membership path for leaf {}", index))?;
    if !tree.verify_proof(&proof) {
        return Err(anyhow!("Generated membership path does not verify"));
    }
    info!("Membership path generated for leaf {}", index);

    let output = MerklePathOutput::new(&proof, &recipient);
    let json = serde_json::to_string_pretty(&output).context("Failed to serialize path")?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write path file: {}", path.display()))?;
            println!("Membership path written to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
