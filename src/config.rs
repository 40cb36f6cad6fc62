//! Configuration management for the gallery server.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `GALLERY_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use gallery_server::config::{Cli, Command};
//!
//! match Cli::parse().command {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Check(config) => println!("Checking {:?}", config.store.backend),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `GALLERY_HOST` - Server bind address (default: 0.0.0.0)
//! - `GALLERY_PORT` - Server port (default: 8787)
//! - `GALLERY_BACKEND` - Store backend, `s3` or `memory` (default: s3)
//! - `GALLERY_S3_BUCKET` - S3 bucket name (required for the s3 backend)
//! - `GALLERY_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `GALLERY_S3_REGION` - AWS region (default: us-east-1)
//! - `GALLERY_METADATA_PREFIX` - Key prefix for metadata objects (default: meta/)
//! - `GALLERY_CACHE_MAX_AGE` - HTTP cache max-age seconds for images (default: 86400)
//! - `GALLERY_MAX_UPLOAD_BYTES` - Upload body limit (default: 50 MiB)
//! - `GALLERY_ADMIN_TOKEN` - Bearer token for upload and delete
//! - `GALLERY_CORS_ORIGINS` - Comma-separated allowed origins
//! - `GALLERY_STATIC_DIR` - Directory of static site files

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::server::{DEFAULT_CACHE_MAX_AGE, DEFAULT_MAX_UPLOAD_BYTES};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8787;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default key prefix for metadata objects in the bucket.
pub const DEFAULT_METADATA_PREFIX: &str = "meta/";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Gallery Server - an image gallery API over object storage.
#[derive(Parser, Debug, Clone)]
#[command(name = "gallery-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(ServeConfig),

    /// Check store connectivity and report gallery contents.
    Check(CheckConfig),
}

/// Which stores back the gallery.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Image bytes and metadata in an S3 bucket
    S3,
    /// Process-local stores, lost on exit
    Memory,
}

/// Store selection shared by every command.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Store backend.
    #[arg(long, value_enum, default_value_t = Backend::S3, env = "GALLERY_BACKEND")]
    pub backend: Backend,

    /// S3 bucket holding images and metadata.
    #[arg(long, env = "GALLERY_S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, R2, etc.).
    #[arg(long, env = "GALLERY_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "GALLERY_S3_REGION")]
    pub s3_region: String,

    /// Key prefix under which metadata values are stored.
    #[arg(long, default_value = DEFAULT_METADATA_PREFIX, env = "GALLERY_METADATA_PREFIX")]
    pub metadata_prefix: String,
}

impl StoreArgs {
    /// Validate the store selection and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.backend == Backend::S3 {
            if self.bucket().is_none() {
                return Err(
                    "S3 bucket name is required. Set --s3-bucket or GALLERY_S3_BUCKET, \
                     or use --backend memory"
                        .to_string(),
                );
            }
            if self.metadata_prefix.is_empty() {
                return Err("metadata_prefix must not be empty".to_string());
            }
            if self.metadata_prefix.starts_with(crate::gallery::STORAGE_PREFIX) {
                return Err(format!(
                    "metadata_prefix must not overlap the image prefix '{}'",
                    crate::gallery::STORAGE_PREFIX
                ));
            }
        }
        Ok(())
    }

    /// The configured bucket, ignoring blank values.
    pub fn bucket(&self) -> Option<&str> {
        self.s3_bucket
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }
}

/// Options for `serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "GALLERY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "GALLERY_PORT")]
    pub port: u16,

    #[command(flatten)]
    pub store: StoreArgs,

    // =========================================================================
    // HTTP Configuration
    // =========================================================================
    /// HTTP Cache-Control max-age in seconds for served images.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "GALLERY_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Maximum upload request size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "GALLERY_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,

    /// Bearer token required for upload and delete.
    ///
    /// If not set, mutating endpoints are open.
    #[arg(long, env = "GALLERY_ADMIN_TOKEN")]
    pub admin_token: Option<String>,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "GALLERY_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Directory of static site files to serve for unmatched GET paths.
    #[arg(long, env = "GALLERY_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.store.validate()?;

        if self.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be greater than 0".to_string());
        }

        if matches!(self.admin_token.as_deref(), Some(t) if t.trim().is_empty()) {
            return Err("admin_token must not be blank when set".to_string());
        }

        if let Some(ref dir) = self.static_dir {
            if !dir.is_dir() {
                return Err(format!("static_dir '{}' is not a directory", dir.display()));
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Options for `check`.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
