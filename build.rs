use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    // Askama templates and sqlx migrations are embedded at compile time.
    watch_files("templates", &["html"]);
    watch_files("migrations", &["sql"]);

    // Shown in the page footer and used to bust asset caches.
    let build_id = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "dev".to_string());
    println!("cargo:rustc-env=PET_RESCUE_BUILD_ID={}", build_id);
}

/// Emits a rerun hint for every file under `root` with one of `extensions`.
fn watch_files(root: &str, extensions: &[&str]) {
    println!("cargo:rerun-if-changed={}", root);
    let mut pending = vec![PathBuf::from(root)];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for path in entries.flatten().map(|e| e.path()) {
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.contains(&ext))
            {
                println!("cargo:rerun-if-changed={}", path.display());
            }
        }
    }
}
