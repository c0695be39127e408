use std::path::Path;
use std::process::Command;

fn main() {
    let repo_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..");

    // Rerun on commits and checkouts only, not on every source edit.
    for watched in [".git/HEAD", ".git/refs/heads"] {
        let path = repo_root.join(watched);
        if path.exists() {
            println!("cargo:rerun-if-changed={}", path.display());
        }
    }
    println!("cargo:rerun-if-env-changed=SLATE_BUILD_SHA");

    // Source tarballs have no .git; packagers can pass the SHA in instead.
    let sha = std::env::var("SLATE_BUILD_SHA")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| git_short_sha(&repo_root))
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=SLATE_BUILD_SHA={sha}");
}

fn git_short_sha(repo_root: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(repo_root)
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let sha = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}
