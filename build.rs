//! Embeds the commit and build time shown by `kubectl-debug --version`.
//!
//! Both values can be pinned through the environment for release builds;
//! `SOURCE_DATE_EPOCH` is honoured so packaged builds are reproducible.

use std::env;
use std::fs;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

const GIT_HASH_ENV: &str = "KUBECTL_DEBUG_BUILD_GIT_HASH";
const TIMESTAMP_ENV: &str = "KUBECTL_DEBUG_BUILD_TIMESTAMP";

fn main() {
    for var in [GIT_HASH_ENV, TIMESTAMP_ENV, "SOURCE_DATE_EPOCH"] {
        println!("cargo:rerun-if-env-changed={var}");
    }
    watch_git_head();

    let commit = env::var(GIT_HASH_ENV)
        .ok()
        .or_else(|| git(&["describe", "--always", "--dirty", "--abbrev=12"]))
        .unwrap_or_else(|| "unknown".to_string());
    let built = env::var(TIMESTAMP_ENV).unwrap_or_else(|_| build_time());

    println!("cargo:rustc-env={GIT_HASH_ENV}={commit}");
    println!("cargo:rustc-env={TIMESTAMP_ENV}={built}");
}

fn watch_git_head() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    if let Some(reference) = fs::read_to_string(".git/HEAD")
        .ok()
        .and_then(|head| head.trim().strip_prefix("ref: ").map(str::to_string))
    {
        println!("cargo:rerun-if-changed=.git/{reference}");
    }
}

/// Seconds since the epoch, from `SOURCE_DATE_EPOCH` when set.
fn build_time() -> String {
    let secs = env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });
    format!("unix:{secs}")
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
