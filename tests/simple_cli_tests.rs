use assert_cmd::Command;

/// Tests that `--help` is handled successfully by the CLI.
///
/// This test verifies:
/// 1. Running `rskeb --help` exits successfully
/// 2. The help text is written to stdout
/// 3. No unexpected stderr output is produced
#[test]
fn test_cli_help_success() {
    let mut cmd = Command::cargo_bin("rskeb").unwrap();

    let assert = cmd.arg("--help").assert().success();

    let out = assert.get_output();
    assert!(!out.stdout.is_empty(), "expected non-empty stdout for --help");
    assert!(
        out.stderr.is_empty(),
        "expected empty stderr for --help, got:\n{}",
        String::from_utf8_lossy(&out.stderr)
    );
}

/// Every subcommand's help must resolve
#[test]
fn test_subcommand_help_success() {
    for sub in ["newest", "mirror", "repack", "status"] {
        let mut cmd = Command::cargo_bin("rskeb").unwrap();
        cmd.args([sub, "--help"]).assert().success();
    }
}

/// A hub run without a repository must fail with guidance
#[test]
fn test_status_requires_repository_or_local_root() {
    let mut cmd = Command::cargo_bin("rskeb").unwrap();
    let assert = cmd
        .env_remove("RSKEB_REPOSITORY")
        .env_remove("RSKEB_LOCAL_ROOT")
        .arg("status")
        .assert()
        .failure();

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("--repository"), "unhelpful error output:\n{stderr}");
}

/// Status against an empty local mirror succeeds and reports zero counts
#[test]
fn test_status_on_empty_local_mirror() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("rskeb").unwrap();
    let assert = cmd
        .env_remove("RSKEB_REPOSITORY")
        .args(["--local-root", dir.path().to_str().unwrap(), "status"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.contains("Artworks: 0"), "unexpected status output:\n{stdout}");
}
