//! Server configuration.
//!
//! Every flag can also be supplied through the environment.

use clap::builder::TypedValueParser;
use clap::{Parser, ValueEnum};
use hashchain_chain::{ChainConfig, DEFAULT_DIFFICULTY};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable output for local development.
    Pretty,
    /// JSON lines for log aggregation.
    Json,
}

/// hashchain HTTP server.
///
/// Serves one in-memory proof-of-work chain per `X-Session-ID` plus the
/// browser UI.
#[derive(Parser, Debug, Clone)]
#[command(name = "hashchain-server", version, about, long_about = None)]
pub struct Config {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(long, short, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Origins allowed by CORS, comma separated. Any origin when empty.
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Directory of static assets served for unmatched paths.
    #[arg(long, env = "STATIC_DIR", default_value = "frontend")]
    pub static_dir: PathBuf,

    /// Leading zero characters required when mining.
    #[arg(
        long,
        short,
        env = "DIFFICULTY",
        default_value_t = DEFAULT_DIFFICULTY,
        value_parser = clap::value_parser!(u8).range(0..=8).map(usize::from)
    )]
    pub difficulty: usize,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Default log filter when `RUST_LOG` is not set.
    #[arg(
        long,
        env = "LOG_LEVEL",
        default_value = "hashchain_server=info,hashchain_chain=info,tower_http=info"
    )]
    pub log_level: String,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            difficulty: self.difficulty,
        }
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            allowed_origins: self
                .allowed_origins
                .iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            static_dir: self.static_dir.clone(),
        }
    }
}

/// Transport settings consumed by the router.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub allowed_origins: Vec<String>,
    pub static_dir: PathBuf,
}
