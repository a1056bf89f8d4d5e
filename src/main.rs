//! Warden - system-user assertion service

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use warden::{
    auth::OsRandomSource,
    config::Args,
    db::{Datastore, Fixtures, MemoryStore, MongoClient, MongoStore},
    logging::{self, AuditLogger},
    server::{self, AppState},
    services::SystemUserService,
    signing::{spawn_cleanup_task, KeypairSigner, SigningKeyCacheConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(&args.log_level, args.log_json);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Warden - system-user assertions");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {}", args.mongodb_uri);
    info!("Series: {}", args.series);
    info!("======================================");

    let (datastore, datastore_kind) = connect_datastore(&args).await?;

    let Some(secret) = args.keystore_secret() else {
        error!("KEYSTORE_SECRET is required in production mode");
        std::process::exit(1);
    };
    let signer = Arc::new(KeypairSigner::new(
        &secret,
        SigningKeyCacheConfig {
            default_ttl: args.key_cache_ttl(),
            ..Default::default()
        },
    ));
    spawn_cleanup_task(Arc::clone(&signer), Duration::from_secs(60));

    let audit = AuditLogger::new(args.node_id.to_string());
    if let Some(ref path) = args.audit_log {
        if let Err(e) = audit.init_file(path.clone()).await {
            warn!("Audit log unavailable ({}): {}", path.display(), e);
        }
    }

    let system_user = SystemUserService::new(
        datastore,
        signer,
        Arc::new(OsRandomSource),
        args.series.clone(),
    );

    let state = Arc::new(
        AppState::new(args, system_user, audit).with_datastore_kind(datastore_kind),
    );

    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Connect to MongoDB, falling back to the in-memory store in dev mode.
async fn connect_datastore(args: &Args) -> anyhow::Result<(Arc<dyn Datastore>, &'static str)> {
    let fixtures = match args.fixtures {
        Some(ref path) => Some(Fixtures::load(path).await?),
        None => None,
    };

    match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            let store = MongoStore::new(&client).await?;
            if let Some(fixtures) = fixtures {
                let seeded = store.seed(fixtures).await?;
                info!("Seeded {} record(s) from fixtures", seeded);
            }
            Ok((Arc::new(store), "mongodb"))
        }
        Err(e) if args.dev_mode => {
            warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
            let store = MemoryStore::from_fixtures(fixtures.unwrap_or_default());
            info!("In-memory store holds {} model(s)", store.model_count().await);
            Ok((Arc::new(store), "memory"))
        }
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    }
}
