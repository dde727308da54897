// Injects REPORTGEN_VERSION from `git describe`, falling back to CARGO_PKG_VERSION

use std::process::Command;

fn main() {
    let pkg_version = env!("CARGO_PKG_VERSION");
    let version = git_describe()
        .map(|described| version_from_describe(&described, pkg_version))
        .unwrap_or_else(|| pkg_version.to_string());

    println!("cargo:rustc-env=REPORTGEN_VERSION={}", version);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");
}

fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let described = String::from_utf8(output.stdout).ok()?;
    Some(described.trim().to_string())
}

/// "v0.2.0" -> "0.2.0", "v0.2.0-3-gabc123" -> "0.2.0", "abc123" -> "<pkg>-abc123"
fn version_from_describe(described: &str, pkg_version: &str) -> String {
    match described.strip_prefix('v') {
        Some(tagged) => tagged.split('-').next().unwrap_or(tagged).to_string(),
        None => format!("{}-{}", pkg_version, described),
    }
}
