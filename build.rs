//! Build script to inject version, git SHA and baked-in client configuration.
//!
//! Environment variables (set by CI or fall back to defaults):
//! - DASHBOARD_VERSION: Version string (defaults to CARGO_PKG_VERSION)
//! - DASHBOARD_GIT_SHA: Git commit SHA (defaults to "unknown" or git rev-parse)
//!
//! WASM builds read their configuration through `option_env!`, so the build
//! must rerun whenever one of the `DASHBOARD_*` settings changes.

use std::process::Command;

/// Settings compiled into the web bundle (see `config::DashboardConfig::from_build_env`)
const BAKED_SETTINGS: &[&str] = &[
    "DASHBOARD_API_BASE_URL",
    "DASHBOARD_AUTH_MODE",
    "DASHBOARD_HOSTED_PUBLISHABLE_KEY",
    "DASHBOARD_HOSTED_FRONTEND_API",
    "DASHBOARD_HOSTED_SIGN_IN_URL",
];

fn main() {
    let version = std::env::var("DASHBOARD_VERSION").unwrap_or_else(|_| {
        std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".into())
    });
    println!("cargo:rustc-env=DASHBOARD_VERSION={}", version);

    // Git SHA: prefer DASHBOARD_GIT_SHA, then GITHUB_SHA, then try git command
    let git_sha = std::env::var("DASHBOARD_GIT_SHA")
        .or_else(|_| std::env::var("GITHUB_SHA").map(|s| s.chars().take(7).collect()))
        .unwrap_or_else(|_| get_git_sha());
    println!("cargo:rustc-env=DASHBOARD_GIT_SHA={}", git_sha);

    println!("cargo:rerun-if-env-changed=DASHBOARD_VERSION");
    println!("cargo:rerun-if-env-changed=DASHBOARD_GIT_SHA");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");
    for name in BAKED_SETTINGS {
        println!("cargo:rerun-if-env-changed={}", name);
    }
}

fn get_git_sha() -> String {
    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .and_then(|o| {
            if o.status.success() {
                String::from_utf8(o.stdout)
                    .ok()
                    .map(|s| s.trim().to_string())
            } else {
                None
            }
        })
        .unwrap_or_else(|| "unknown".into())
}
