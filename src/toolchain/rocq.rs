//! Rocq installation on top of a ready switch

use super::{PinSource, Toolchain};
use crate::error::SetupResult;
use crate::version::RocqVersion;
use tracing::info;

const ROCQ_REPO: &str = "git+https://github.com/rocq-prover/rocq.git";
const STDLIB_REPO: &str = "git+https://github.com/rocq-prover/stdlib.git";

/// Packages pinned to the development sources, in pin order
const DEV_PINS: &[(&str, &str)] = &[
    ("rocq-runtime.dev", ROCQ_REPO),
    ("rocq-core.dev", ROCQ_REPO),
    ("coq-core.dev", ROCQ_REPO),
    ("coq-stdlib.dev", STDLIB_REPO),
];

/// Install Rocq at `version` into the current switch.
pub async fn install_rocq(toolchain: &dyn Toolchain, version: &RocqVersion) -> SetupResult<()> {
    info!("Installing Rocq {}", version);

    match version {
        RocqVersion::Dev => {
            for (package, url) in DEV_PINS {
                toolchain.pin(package, &PinSource::Git(url.to_string())).await?;
            }
            toolchain.pin("coq.dev", &PinSource::DevRepo).await?;
            toolchain.install("coq.dev", &["--unset-root"]).await
        }
        RocqVersion::Latest => toolchain.install("coq", &["--unset-root"]).await,
        RocqVersion::Specific(v) => {
            toolchain
                .install(&format!("coq.{}", v), &["--unset-root"])
                .await
        }
    }
}
