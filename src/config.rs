use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use clap::{Parser, ValueEnum};

use crate::queue::DEFAULT_QUEUE_NAME;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/";
/// Same ceiling a stock JSON body parser applies.
pub const DEFAULT_BODY_LIMIT: usize = 100 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Parser)]
#[command(about = "Accepts code submissions over HTTP and pushes them onto a queue")]
pub struct Config {
    #[arg(long, env = "GATEWAY_HOST", default_value_t = IpAddr::V6(Ipv6Addr::UNSPECIFIED))]
    pub host: IpAddr,
    #[arg(long, short, env = "GATEWAY_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    #[arg(long, env = "GATEWAY_STORE", value_enum, default_value_t = StoreKind::Redis)]
    pub store: StoreKind,
    #[arg(long, env = "REDIS_URL", default_value = DEFAULT_REDIS_URL)]
    pub redis_url: String,
    #[arg(long, env = "GATEWAY_QUEUE", default_value = DEFAULT_QUEUE_NAME)]
    pub queue_name: String,
    #[arg(long, env = "GATEWAY_BODY_LIMIT", default_value_t = DEFAULT_BODY_LIMIT)]
    pub body_limit: usize,
    /// Answer 503 instead of 200 when the queue push fails
    #[arg(long, env = "GATEWAY_STRICT_STATUS")]
    pub strict_status: bool,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V6(Ipv6Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            store: StoreKind::Redis,
            redis_url: DEFAULT_REDIS_URL.to_owned(),
            queue_name: DEFAULT_QUEUE_NAME.to_owned(),
            body_limit: DEFAULT_BODY_LIMIT,
            strict_status: false,
        }
    }
}
