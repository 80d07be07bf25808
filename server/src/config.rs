use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Image processing job service")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Where uploads and processed images are stored
    #[arg(long, env = "UPLOADS_DIR", default_value = "uploads")]
    pub uploads_dir: PathBuf,

    /// Simulated duration of the light stage, in milliseconds
    #[arg(long, env = "LIGHT_DELAY_MS", default_value_t = 1_000)]
    pub light_delay_ms: u64,

    /// Simulated duration of the heavy stage, in milliseconds
    #[arg(long, env = "HEAVY_DELAY_MS", default_value_t = 60_000)]
    pub heavy_delay_ms: u64,
}

impl Config {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn light_delay(&self) -> Duration {
        Duration::from_millis(self.light_delay_ms)
    }

    pub fn heavy_delay(&self) -> Duration {
        Duration::from_millis(self.heavy_delay_ms)
    }
}
