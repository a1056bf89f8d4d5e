//! Warden seal-key - generate a sealed system-user signing key
//!
//! Prints the key id, public key and sealed private key as JSON. Store the
//! key id in a model's `key_id_user` and the sealed key in `sealed_key_user`.
//!
//! Usage:
//!   warden-seal-key --keystore-secret <secret>
//!
//! Environment variables:
//!   KEYSTORE_SECRET - Secret the server uses to unseal keys

use clap::Parser;
use serde::Serialize;
use warden::signing::crypto::{generate_keypair, key_fingerprint, seal_signing_key};

#[derive(Parser, Debug)]
#[command(name = "warden-seal-key")]
#[command(about = "Generate and seal an Ed25519 key for system-user signing")]
#[command(version)]
struct Args {
    /// Secret the server uses to unseal keys
    #[arg(long, env = "KEYSTORE_SECRET", hide_env_values = true)]
    keystore_secret: String,

    /// Print the JSON on a single line
    #[arg(long)]
    compact: bool,
}

#[derive(Serialize)]
struct SealedKeyOutput {
    /// Value for `key_id_user` and the `sign-key-sha3-384` header
    key_id: String,
    /// Hex-encoded Ed25519 public key
    public_key: String,
    /// Value for `sealed_key_user`
    sealed_key: String,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    if args.keystore_secret.trim().is_empty() {
        anyhow::bail!("KEYSTORE_SECRET must not be empty");
    }

    let (signing_key, verifying_key) = generate_keypair();
    let output = SealedKeyOutput {
        key_id: key_fingerprint(&verifying_key),
        public_key: hex::encode(verifying_key.as_bytes()),
        sealed_key: seal_signing_key(&signing_key, args.keystore_secret.as_bytes())?,
    };

    let json = if args.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{json}");

    Ok(())
}
