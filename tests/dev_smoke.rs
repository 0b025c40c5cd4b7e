use assert_cmd::prelude::*;
use std::process::Command;

use tempfile::TempDir;

fn bin() -> Command {
    Command::cargo_bin("kube-lograb").unwrap()
}

#[test]
fn dev_smoke_writes_one_file_per_ready_container() {
    let out = TempDir::new().unwrap();

    bin()
        .env("RUST_LOG", "off")
        .args(["--dev", "-n", "default", "--dev-rate-ms", "1", "--dev-lines", "3"])
        .arg("--out-dir")
        .arg(out.path())
        .assert()
        .success();

    for container in ["app", "sidecar"] {
        let path = out
            .path()
            .join(format!("default_dev-pod-1_dev-uid-1_{container}.log"));
        let content = std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("missing {}: {e}", path.display()));

        let expected: String = (1..=3)
            .map(|i| format!("dev-pod-1/{container} log line {i}\n"))
            .collect();
        assert_eq!(content, expected);
    }

    let files = std::fs::read_dir(out.path()).unwrap().count();
    assert_eq!(files, 2);
}

#[test]
fn dev_smoke_creates_nested_out_dir() {
    let out = TempDir::new().unwrap();
    let nested = out.path().join("workspace_logs").join("run-1");

    bin()
        .env("RUST_LOG", "off")
        .args(["--dev", "--dev-rate-ms", "1", "--dev-lines", "1"])
        .arg("-o")
        .arg(&nested)
        .assert()
        .success();

    assert!(nested
        .join("default_dev-pod-1_dev-uid-1_app.log")
        .exists());
}

#[test]
fn unreadable_kubeconfig_is_fatal() {
    let out = TempDir::new().unwrap();

    bin()
        .env("RUST_LOG", "off")
        .arg("--kubeconfig")
        .arg(out.path().join("does-not-exist"))
        .arg("-o")
        .arg(out.path())
        .assert()
        .failure();
}

#[test]
fn zero_follower_limit_is_rejected() {
    bin()
        .env("RUST_LOG", "off")
        .args(["--dev", "--max-followers", "0"])
        .assert()
        .failure();
}
