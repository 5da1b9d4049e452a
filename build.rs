//! Build script: embeds flags/*.svg into `$OUT_DIR/flags_data.rs`.
//!
//! Every asset is parsed with usvg first so a broken SVG fails the build
//! instead of rendering garbage at runtime.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[allow(dead_code)]
#[path = "src/codegen.rs"]
mod codegen;

fn main() {
    println!("cargo::rerun-if-env-changed=FLAGKIT_FLAGS_DIR");

    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    let flags_dir = env::var_os("FLAGKIT_FLAGS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| manifest_dir.join("flags"));
    let flags_dir = flags_dir
        .canonicalize()
        .unwrap_or_else(|e| panic!("Flags directory {} not found: {}", flags_dir.display(), e));

    println!("cargo::rerun-if-changed={}", flags_dir.display());

    let scan = codegen::scan_dir(&flags_dir).expect("Failed to read flags directory");
    for name in &scan.skipped {
        println!("cargo::warning=Skipping {} (not a unique two-letter country code)", name);
    }

    let options = resvg::usvg::Options::default();
    for source in &scan.sources {
        let data = fs::read_to_string(&source.path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", source.path.display(), e));
        if let Err(e) = resvg::usvg::Tree::from_str(&data, &options) {
            panic!("Invalid SVG {}: {}", source.path.display(), e);
        }
    }

    let generated_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs();
    let table = codegen::render_table(&scan.sources, generated_at);

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));
    fs::write(out_dir.join("flags_data.rs"), table).expect("Failed to write flags_data.rs");
}
