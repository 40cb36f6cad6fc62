//! Gallery Server - an image gallery API over object storage.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gallery_server::{
    config::{Backend, CheckConfig, Cli, Command, ServeConfig, StoreArgs},
    create_s3_client,
    gallery::{GalleryService, STORAGE_PREFIX},
    server::{create_router, RouterConfig},
    store::{
        BlobStore, MemoryBlobStore, MemoryMetadataStore, MetadataStore, S3BlobStore,
        S3MetadataStore,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Stores
// =============================================================================

type Stores = (Arc<dyn BlobStore>, Arc<dyn MetadataStore>);

/// Build the blob and metadata stores for the configured backend.
///
/// Call `StoreArgs::validate` first; a missing bucket is reported as an error.
async fn open_stores(args: &StoreArgs) -> Result<Stores, String> {
    match args.backend {
        Backend::Memory => Ok((
            Arc::new(MemoryBlobStore::new()),
            Arc::new(MemoryMetadataStore::new()),
        )),
        Backend::S3 => {
            let bucket = args
                .bucket()
                .ok_or_else(|| "S3 bucket name is required".to_string())?;
            let client = create_s3_client(args.s3_endpoint.as_deref(), &args.s3_region).await;
            Ok((
                Arc::new(S3BlobStore::new(client.clone(), bucket)),
                Arc::new(S3MetadataStore::new(
                    client,
                    bucket,
                    args.metadata_prefix.clone(),
                )),
            ))
        }
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Gallery Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    match config.store.backend {
        Backend::S3 => {
            info!("  Backend: s3");
            info!("  S3 bucket: {}", config.store.bucket().unwrap_or_default());
            if let Some(ref endpoint) = config.store.s3_endpoint {
                info!("  S3 endpoint: {}", endpoint);
            }
            info!("  S3 region: {}", config.store.s3_region);
            info!("  Metadata prefix: {}", config.store.metadata_prefix);
        }
        Backend::Memory => {
            warn!("  Backend: memory - uploads are lost when the server stops");
        }
    }

    if config.admin_token.is_some() {
        info!("  Admin token: required for upload and delete");
    } else {
        warn!("  Admin token: NOT SET - anyone can upload and delete");
        warn!("        Set --admin-token for public deployments");
    }
    if let Some(ref dir) = config.static_dir {
        info!("  Static files: {}", dir.display());
    }

    let (blobs, metadata) = match open_stores(&config.store).await {
        Ok(stores) => stores,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Test store connectivity
    info!("");
    info!("Connecting to {}...", blobs.identifier());
    match count_images(blobs.as_ref()).await {
        Ok(count) => {
            info!("  Connected successfully");
            info!("  Found {} image object(s)", count);
        }
        Err(e) => {
            error!("  Failed to reach blob store: {}", e);
            error!("");
            error!("  Please check:");
            error!("    - Your AWS credentials are configured correctly");
            error!("    - The bucket exists and is accessible");
            error!("    - The S3 endpoint is correct (if using MinIO/R2/custom S3)");
            return ExitCode::FAILURE;
        }
    }

    let gallery = GalleryService::new(blobs, metadata);
    let router = create_router(gallery, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/gallery", addr);
    info!("    curl http://{}/groups", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Count image objects under the storage prefix.
async fn count_images(blobs: &dyn BlobStore) -> Result<usize, String> {
    blobs
        .list(STORAGE_PREFIX)
        .await
        .map(|objects| objects.len())
        .map_err(|e| e.to_string())
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "gallery_server=debug,tower_http=debug"
    } else {
        "gallery_server=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_max_upload_bytes(config.max_upload_bytes)
        .with_tracing(!config.no_tracing);

    if let Some(ref token) = config.admin_token {
        router_config = router_config.with_admin_token(token.trim());
    }

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    if let Some(ref dir) = config.static_dir {
        router_config = router_config.with_static_dir(dir.clone());
    }

    router_config
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("Gallery Server Configuration Check");
    println!("═══════════════════════════════════");
    println!();

    if let Err(e) = config.store.validate() {
        println!("✗ Configuration: {}", e);
        return ExitCode::FAILURE;
    }

    match config.store.backend {
        Backend::Memory => {
            println!("✓ Backend: memory (nothing to check)");
            return ExitCode::SUCCESS;
        }
        Backend::S3 => {
            println!("✓ Bucket: {}", config.store.bucket().unwrap_or_default());
            if let Some(ref endpoint) = config.store.s3_endpoint {
                println!("✓ Endpoint: {}", endpoint);
            }
            println!("✓ Region: {}", config.store.s3_region);
            println!("✓ Metadata prefix: {}", config.store.metadata_prefix);
        }
    }
    println!();

    let (blobs, metadata) = match open_stores(&config.store).await {
        Ok(stores) => stores,
        Err(e) => {
            println!("✗ {}", e);
            return ExitCode::FAILURE;
        }
    };

    print!("Listing image objects... ");
    let image_count = match count_images(blobs.as_ref()).await {
        Ok(count) => {
            println!("✓ {} found", count);
            count
        }
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            println!();
            println!("Please check:");
            println!("  - Your AWS credentials are configured correctly");
            println!("  - The bucket exists and is accessible");
            if config.store.s3_endpoint.is_some() {
                println!("  - The S3 endpoint is correct and reachable");
            }
            return ExitCode::FAILURE;
        }
    };

    let gallery = GalleryService::new(blobs, metadata);

    print!("Reading gallery index... ");
    let indexed = match gallery.index().await {
        Ok(ids) => {
            println!("✓ {} entries", ids.len());
            ids.len()
        }
        Err(e) => {
            println!("✗ {}", e);
            return ExitCode::FAILURE;
        }
    };

    match gallery.list_groups().await {
        Ok(groups) => println!("✓ Groups: {}", groups.len()),
        Err(e) => {
            println!("✗ Listing groups failed: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if indexed != image_count {
        println!();
        println!(
            "! Index has {} entries but {} image objects exist; the stores have drifted",
            indexed, image_count
        );
    }

    println!();
    println!("═══════════════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}
