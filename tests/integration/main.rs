//! Integration tests for rocq-setup

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Binary isolated from the host's config, state and CI environment
    fn rocq_setup(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("rocq-setup");
        cmd.env("ROCQ_SETUP_CONFIG", temp.path().join("config.toml"))
            .env("ROCQ_SETUP_STATE", temp.path().join("state.json"))
            .env_remove("INPUT_ROCQ-VERSION")
            .env_remove("GITHUB_ACTIONS")
            .env_remove("GITHUB_ENV")
            .env_remove("GITHUB_PATH")
            .env_remove("RUST_LOG");
        cmd
    }

    fn write_state(temp: &TempDir, entries: &str) {
        std::fs::write(
            temp.path().join("state.json"),
            format!("{{\"entries\": {}}}", entries),
        )
        .unwrap();
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        rocq_setup(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cached opam toolchain"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        rocq_setup(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("rocq-setup"));
    }

    #[test]
    fn key_prints_primary_then_fallbacks() {
        let temp = TempDir::new().unwrap();
        let output = rocq_setup(&temp)
            .args(["key", "--rocq-version", "8.20.0"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let stdout = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("setup-rocq-v1-"));
        assert!(lines[0].ends_with("-rocq-8.20.0"));
        assert!(lines[1].ends_with("-rocq-"));
        assert!(lines[0].starts_with(lines[1]));
        assert!(lines[1].starts_with(lines[2]));
    }

    #[test]
    fn key_defaults_to_latest() {
        let temp = TempDir::new().unwrap();
        rocq_setup(&temp)
            .arg("key")
            .assert()
            .success()
            .stdout(predicate::str::contains("-rocq-latest\n"));
    }

    #[test]
    fn key_as_json() {
        let temp = TempDir::new().unwrap();
        rocq_setup(&temp)
            .args(["key", "--format", "json", "--rocq-version", "dev"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"key\""))
            .stdout(predicate::str::contains("\"fallback_prefixes\""))
            .stdout(predicate::str::contains("\"toolchain_version\": \"dev\""));
    }

    #[test]
    fn invalid_version_fails_with_single_error() {
        let temp = TempDir::new().unwrap();
        rocq_setup(&temp)
            .args(["run", "--rocq-version", "8.20; rm -rf /"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("Invalid Rocq version"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        rocq_setup(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        rocq_setup(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[toolchain]"))
            .stdout(predicate::str::contains("namespace_version = \"v1\""));
    }

    #[test]
    fn config_init_writes_defaults() {
        let temp = TempDir::new().unwrap();
        rocq_setup(&temp)
            .args(["config", "init"])
            .assert()
            .success();

        let written = std::fs::read_to_string(temp.path().join("config.toml")).unwrap();
        assert!(written.contains("[cache]"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("config.toml"),
            "[toolchain]\nopam_version = \"two\"\n",
        )
        .unwrap();

        rocq_setup(&temp)
            .arg("key")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn save_without_state_is_skipped() {
        let temp = TempDir::new().unwrap();
        rocq_setup(&temp)
            .args(["save", "--no-clean"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No run state recorded"));
    }

    #[test]
    fn save_without_key_is_skipped() {
        let temp = TempDir::new().unwrap();
        write_state(&temp, r#"{"CACHE_RESTORED": "false"}"#);

        rocq_setup(&temp)
            .args(["save", "--no-clean"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache key found"));
    }

    #[test]
    fn save_with_cache_disabled_succeeds() {
        let temp = TempDir::new().unwrap();
        write_state(
            &temp,
            r#"{"CACHE_RESTORED": "false", "CACHE_KEY": "setup-rocq-v1-linux-x86_64-rocq-latest"}"#,
        );

        rocq_setup(&temp)
            .args(["save", "--no-clean", "--no-cache"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache saved"));
    }
}
