use crate::preprocessing::PrepConfig;
use crate::Args;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    /// Pipeline parameters used when a request does not override them
    pub defaults: PrepConfig,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            max_file_size: args.max_file_size,
            defaults: PrepConfig {
                block_size: args.block_size,
                k: args.k,
                r: args.r,
            },
        }
    }
}
