//! The `montage serve` command.

use std::sync::Arc;

use clap::Args;
use montage_core::{Config, Montage};

use crate::server;

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides `server.bind`)
    #[arg(long)]
    pub bind: Option<String>,

    /// Bucket merged images are stored in (overrides `storage.bucket`)
    #[arg(long, env = "MONTAGE_BUCKET")]
    pub bucket: Option<String>,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, config: Config) -> anyhow::Result<()> {
    let config = apply_overrides(config, args);
    let bind = config.server.bind.clone();

    let montage = Montage::from_config(config)?;
    tracing::info!(
        "Storing merged images in bucket '{}' via {} backend",
        montage.config().storage.bucket,
        montage.store_name()
    );

    server::run(Arc::new(montage), &bind).await
}

fn apply_overrides(mut config: Config, args: ServeArgs) -> Config {
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(bucket) = args.bucket {
        config.storage.bucket = bucket;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = ServeArgs {
            bind: Some("0.0.0.0:9000".into()),
            bucket: Some("shots".into()),
        };
        let config = apply_overrides(Config::default(), args);
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.storage.bucket, "shots");
    }

    #[test]
    fn test_missing_flags_keep_config() {
        let args = ServeArgs {
            bind: None,
            bucket: None,
        };
        let config = apply_overrides(Config::default(), args);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.storage.bucket, "montage-output");
    }
}
