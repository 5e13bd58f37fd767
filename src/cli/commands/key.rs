//! Key command - print the cache key for this host

use crate::cache::CacheIdentity;
use crate::cli::args::{KeyArgs, OutputFormat};
use crate::config::Config;
use crate::error::SetupResult;
use crate::version::RocqVersion;
use serde::Serialize;

#[derive(Serialize)]
struct KeyReport<'a> {
    key: String,
    fallback_prefixes: Vec<String>,
    #[serde(flatten)]
    identity: &'a CacheIdentity,
}

/// Execute the key command
pub async fn execute(args: KeyArgs, config: &Config) -> SetupResult<()> {
    let version = match args.rocq_version.as_deref() {
        Some(v) => v.parse()?,
        None => RocqVersion::default(),
    };
    let identity = CacheIdentity::for_host(&config.cache.namespace_version, &version);

    match args.format {
        OutputFormat::Plain => {
            println!("{}", identity.key());
            for prefix in identity.fallback_prefixes() {
                println!("{}", prefix);
            }
        }
        OutputFormat::Json => {
            let report = KeyReport {
                key: identity.key(),
                fallback_prefixes: identity.fallback_prefixes(),
                identity: &identity,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
