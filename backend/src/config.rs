use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Runtime configuration. Every flag can also be set through its
/// environment variable.
#[derive(Parser, Debug, Clone)]
#[command(name = "volunteer-backend", about = "Volunteer register upload service")]
pub struct Config {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "VOLUNTEER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "VOLUNTEER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// SQLite database file holding the volunteer register.
    #[arg(long, env = "VOLUNTEER_DB", default_value = "volunteers.sqlite")]
    pub database: PathBuf,

    /// Records submitted to the store per insert call.
    #[arg(long, env = "VOLUNTEER_BATCH_SIZE", default_value = "50")]
    pub batch_size: NonZeroUsize,

    /// Batches allowed in flight against the store at once.
    #[arg(long, env = "VOLUNTEER_BATCH_CONCURRENCY", default_value = "1")]
    pub batch_concurrency: NonZeroUsize,

    /// Largest accepted upload, in megabytes.
    #[arg(long, env = "VOLUNTEER_MAX_UPLOAD_MB", default_value_t = 10)]
    pub max_upload_mb: usize,
}

impl Config {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}
