//! opam-backed toolchain

use super::{parse_sh_env, PinSource, Toolchain};
use crate::config::schema::ToolchainConfig;
use crate::error::{SetupError, SetupResult};
use crate::exec;
use crate::platform::{Architecture, Platform};
use crate::runner::RunnerEnv;
use async_trait::async_trait;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// opam driven through its CLI
pub struct Opam {
    config: ToolchainConfig,
    platform: Platform,
    arch: Architecture,
    env: RunnerEnv,
}

impl Opam {
    pub fn new(
        config: ToolchainConfig,
        platform: Platform,
        arch: Architecture,
        env: RunnerEnv,
    ) -> Self {
        Self {
            config,
            platform,
            arch,
            env,
        }
    }

    /// Absolute path of the opam binary once acquired
    pub fn binary(&self) -> PathBuf {
        self.config.tool_dir().join("opam")
    }

    /// Release asset URL for this host
    pub fn download_url(&self) -> SetupResult<String> {
        let os = match self.platform {
            Platform::Linux => "linux",
            Platform::MacOS => "macos",
            Platform::Other(ref os) => {
                return Err(SetupError::UnsupportedPlatform {
                    os: os.clone(),
                    arch: self.arch.as_str().to_string(),
                })
            }
        };
        let arch = self
            .arch
            .opam_asset_name()
            .ok_or_else(|| SetupError::UnsupportedPlatform {
                os: os.to_string(),
                arch: self.arch.as_str().to_string(),
            })?;

        let version = &self.config.opam_version;
        Ok(format!(
            "{}/{}/opam-{}-{}-{}",
            self.config.download_base_url.trim_end_matches('/'),
            version,
            version,
            arch,
            os
        ))
    }

    fn init_args(&self) -> Vec<&str> {
        let mut args = vec!["init", "--bare", "--yes"];
        if self.config.disable_sandboxing {
            args.push("--disable-sandboxing");
        }
        args
    }

    async fn opam(&self, args: &[&str]) -> SetupResult<()> {
        exec::run(&self.program(), args).await
    }

    fn program(&self) -> String {
        self.binary().to_string_lossy().into_owned()
    }

    /// OPAMROOT and the binary directory, for this process and later steps
    async fn export_opam_location(&self) -> SetupResult<()> {
        self.env.add_path(&self.config.tool_dir()).await?;
        self.env
            .export_var("OPAMROOT", &self.config.opam_root().to_string_lossy())
            .await
    }
}

#[async_trait]
impl Toolchain for Opam {
    async fn acquire(&self) -> SetupResult<()> {
        let binary = self.binary();
        if tokio::fs::try_exists(&binary).await.unwrap_or(false) {
            info!("opam already present at {}", binary.display());
        } else {
            let url = self.download_url()?;
            info!("Downloading opam {}", self.config.opam_version);
            let target = binary.clone();
            tokio::task::spawn_blocking(move || download(&url, &target))
                .await
                .map_err(|e| SetupError::Internal(format!("download task failed: {}", e)))??;
        }

        self.env.add_path(&self.config.tool_dir()).await
    }

    async fn initialize(&self) -> SetupResult<()> {
        self.export_opam_location().await?;
        self.opam(&self.init_args()).await
    }

    async fn create_switch(&self) -> SetupResult<()> {
        self.opam(&[
            "switch",
            "create",
            &self.config.switch,
            &self.config.compiler,
            "--yes",
        ])
        .await
    }

    async fn export_env(&self) -> SetupResult<()> {
        self.export_opam_location().await?;

        let switch_arg = format!("--switch={}", self.config.switch);
        let output = exec::output(
            &self.program(),
            &["env", &switch_arg, "--set-switch", "--shell=sh"],
        )
        .await?;

        for (name, value) in parse_sh_env(&output)? {
            self.env.export_var(&name, &value).await?;
        }
        Ok(())
    }

    async fn disable_secondary_cache(&self) -> SetupResult<()> {
        self.env.export_var("DUNE_CACHE", "disabled").await
    }

    async fn pin(&self, package: &str, source: &PinSource) -> SetupResult<()> {
        match source {
            PinSource::Git(url) => {
                self.opam(&["pin", "add", "--no-action", "--yes", package, url])
                    .await
            }
            PinSource::DevRepo => {
                self.opam(&["pin", "add", "--no-action", "--yes", "--dev-repo", package])
                    .await
            }
        }
    }

    async fn install(&self, package: &str, flags: &[&str]) -> SetupResult<()> {
        let mut args = vec!["install", "--yes", package];
        args.extend_from_slice(flags);
        self.opam(&args).await
    }

    async fn clean(&self) -> SetupResult<()> {
        // Runs in a later process than the one that exported OPAMROOT
        std::env::set_var("OPAMROOT", self.config.opam_root());
        self.opam(&[
            "clean",
            "--all-switches",
            "--download-cache",
            "--logs",
            "--repo-cache",
            "--unused-repositories",
        ])
        .await
    }
}

/// Fetch `url` into `target`, leaving nothing behind on failure.
fn download(url: &str, target: &Path) -> SetupResult<()> {
    let failed = |reason: String| SetupError::Download {
        url: url.to_string(),
        reason,
    };

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| SetupError::io(format!("creating {}", parent.display()), e))?;
    }

    let response = ureq::get(url).call().map_err(|e| failed(e.to_string()))?;
    let mut reader = response.into_body().into_reader();

    let partial = target.with_extension("partial");
    let result = write_executable(&mut reader, &partial, target);

    if result.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    result
}

fn write_executable(reader: &mut impl Read, partial: &Path, target: &Path) -> SetupResult<()> {
    let mut file = std::fs::File::create(partial)
        .map_err(|e| SetupError::io(format!("creating {}", partial.display()), e))?;
    let copied = std::io::copy(reader, &mut file)
        .map_err(|e| SetupError::io(format!("writing {}", partial.display()), e))?;
    file.flush()
        .map_err(|e| SetupError::io(format!("writing {}", partial.display()), e))?;
    debug!("Wrote {} bytes to {}", copied, partial.display());

    make_executable(partial)?;
    std::fs::rename(partial, target)
        .map_err(|e| SetupError::io(format!("installing {}", target.display()), e))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> SetupResult<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| SetupError::io(format!("setting permissions on {}", path.display()), e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> SetupResult<()> {
    Ok(())
}
