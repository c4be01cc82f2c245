//! CLI tests for the `vercel-blob` binary

#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use predicates::prelude::*;

    fn cli() -> Command {
        let mut cmd = Command::cargo_bin("vercel-blob").unwrap();
        cmd.env_remove("BLOB_READ_WRITE_TOKEN").env_remove("RUST_LOG");
        cmd
    }

    #[test]
    fn test_help_lists_subcommands() {
        cli()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("put"))
            .stdout(predicate::str::contains("download"));
    }

    #[test]
    fn test_put_without_token_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "hello").unwrap();

        cli()
            .args(["--api-url", "http://127.0.0.1:9", "put"])
            .arg(&file)
            .assert()
            .failure()
            .stderr(predicate::str::contains("BLOB_READ_WRITE_TOKEN"));
    }

    #[test]
    fn test_invalid_config_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.yaml");
        std::fs::write(&config, "upload:\n  max_concurrent_uploads: 0\n").unwrap();

        cli()
            .arg("--config")
            .arg(&config)
            .args(["list"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("max_concurrent_uploads"));
    }

    #[test]
    fn test_delete_requires_url() {
        cli().arg("delete").assert().failure();
    }
}
