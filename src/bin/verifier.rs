use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{debug, error, info};
use std::path::PathBuf;
use zkp_airdrop_verifier::{
    config::Config, utils::sanitize_for_log, ProofFile, ProofSystem, Verifier,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Proof JSON produced by the prover
    #[arg(short, long)]
    proof_file: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// snarkjs verification key; overrides the configured path
    #[arg(short = 'k', long)]
    verification_key: Option<PathBuf>,

    /// Proof system; overrides the configured one
    #[arg(short = 's', long, value_enum)]
    proof_system: Option<ProofSystem>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(path) = args.verification_key {
        config.verifier.verification_key = path;
    }
    if let Some(system) = args.proof_system {
        config.verifier.proof_system = system;
    }

    if !args.proof_file.exists() {
        return Err(anyhow!(
            "Proof file does not exist: {}",
            args.proof_file.display()
        ));
    }

    info!("Loading proof from: {}", args.proof_file.display());
    println!("Loading proof from: {}", args.proof_file.display());
    let proof = ProofFile::load(&args.proof_file, config.proof.max_file_size)?;

    proof
        .validate(&config.security)
        .context("Proof validation failed. The proof file is malformed or stale.")?;
    info!("Proof file validation passed");

    if proof.proof_system != config.verifier.proof_system {
        return Err(anyhow!(
            "Proof was generated for {}, but the verifier is configured for {}",
            proof.proof_system,
            config.verifier.proof_system
        ));
    }

    println!("Proof details:");
    println!("  Proof System: {}", proof.proof_system);
    println!("  Merkle Root: {}", proof.public_signals[0]);
    println!("  Recipient: {}", proof.public_signals[1]);
    println!("  Nullifier: {}", proof.public_signals[2]);
    println!("  Timestamp: {}", proof.timestamp);
    debug!(
        "Proof details: nullifier={}, timestamp={}",
        sanitize_for_log(&proof.public_signals[2]),
        proof.timestamp
    );

    info!(
        "Loading verification key from: {}",
        config.verifier.verification_key.display()
    );
    let verifier = Verifier::from_config(&config.verifier)?;

    let proof_words = proof.proof_words()?;
    let public_words = proof.public_words()?;

    info!("Verifying {} proof", verifier.proof_system());
    println!("Verifying ZK proof...");
    match verifier.verify_words(&proof_words, &public_words) {
        Ok(()) => {
            info!("Proof verification PASSED");
            println!("\n✓ Proof verification PASSED!");
            println!("The claimant has demonstrated membership in the eligible set");
            println!("and bound the claim to the recipient above.");
            println!("\nNullifier: {}", proof.public_signals[2]);
            println!("Record it before paying out; a second claim reuses it.");
            Ok(())
        }
        Err(e) => {
            error!("Proof verification FAILED ({:?}): {e}", e.kind());
            println!("\n✗ Proof verification FAILED!");
            println!("Error: {e}");
            Err(anyhow!("Proof verification failed"))
        }
    }
}
