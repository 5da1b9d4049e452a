//! Flag table generator.
//!
//! Turns a directory of `<code>.svg` files into Rust source holding the
//! embedded lookup table, the sorted country manifest and a generation
//! timestamp. Used by `build.rs` (via `#[path]`) and usable on its own to
//! produce tables for other asset directories.
//!
//! Only std is used here since the build script compiles this file too.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One source file that passed the filename check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSource {
    /// Lowercase two-letter code taken from the file stem
    pub code: String,
    /// Absolute or caller-supplied path to the SVG file
    pub path: PathBuf,
}

/// Result of scanning an asset directory.
#[derive(Debug, Default)]
pub struct SourceScan {
    /// Accepted sources, sorted by code, one per code
    pub sources: Vec<FlagSource>,
    /// SVG file names that were ignored (bad code or duplicate)
    pub skipped: Vec<String>,
}

/// Returns true if `code` is exactly two ASCII lowercase letters.
pub fn is_country_code(code: &str) -> bool {
    code.len() == 2 && code.bytes().all(|b| b.is_ascii_lowercase())
}

/// Scans `dir` for `*.svg` files named after a country code.
///
/// File stems are lowercased, so `US.svg` and `us.svg` are the same code;
/// the first one in sorted path order wins and the rest are reported in
/// `skipped`.
pub fn scan_dir(dir: &Path) -> io::Result<SourceScan> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
        })
        .collect();
    paths.sort();

    let mut scan = SourceScan::default();
    for path in paths {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let code = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if !is_country_code(&code) || scan.sources.iter().any(|s| s.code == code) {
            scan.skipped.push(file_name);
            continue;
        }
        scan.sources.push(FlagSource { code, path });
    }

    scan.sources.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(scan)
}

/// Renders the generated module for `sources`.
///
/// `sources` must already be sorted and deduplicated (as `scan_dir`
/// returns them); the runtime relies on that for binary search.
pub fn render_table(sources: &[FlagSource], generated_at: u64) -> String {
    let mut out = String::new();
    out.push_str("// Auto-generated by build.rs - do not edit manually\n\n");
    out.push_str(&format!(
        "/// Unix timestamp of table generation\npub const GENERATED_AT: u64 = {generated_at};\n\n"
    ));

    out.push_str("/// Country code to raw SVG markup, sorted by code\n");
    out.push_str("pub static FLAGS: &[(&str, &str)] = &[\n");
    for source in sources {
        out.push_str(&format!(
            "    ({:?}, include_str!({:?})),\n",
            source.code,
            source.path.to_string_lossy()
        ));
    }
    out.push_str("];\n\n");

    out.push_str("/// Sorted country codes with an embedded flag\n");
    out.push_str("pub static AVAILABLE_COUNTRIES: &[&str] = &[\n");
    for source in sources {
        out.push_str(&format!("    {:?},\n", source.code));
    }
    out.push_str("];\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("flagkit-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_is_country_code() {
        assert!(is_country_code("us"));
        assert!(!is_country_code("US"));
        assert!(!is_country_code("usa"));
        assert!(!is_country_code(""));
        assert!(!is_country_code("u1"));
    }

    #[test]
    fn test_scan_dir_sorts_and_filters() {
        let dir = scratch_dir("scan");
        for name in ["us.svg", "de.svg", "GB.svg", "readme.txt", "usa.svg", "fr.png"] {
            fs::write(dir.join(name), "<svg/>").unwrap();
        }

        let scan = scan_dir(&dir).unwrap();
        let codes: Vec<&str> = scan.sources.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["de", "gb", "us"]);
        assert_eq!(scan.skipped, vec!["usa.svg".to_string()]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_scan_dir_deduplicates_case_variants() {
        let dir = scratch_dir("dedup");
        fs::write(dir.join("FR.svg"), "<svg/>").unwrap();
        fs::write(dir.join("fr.svg"), "<svg/>").unwrap();

        let scan = scan_dir(&dir).unwrap();
        assert_eq!(scan.sources.len(), 1);
        assert_eq!(scan.skipped.len(), 1);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_render_table_layout() {
        let sources = vec![
            FlagSource { code: "de".into(), path: PathBuf::from("/flags/de.svg") },
            FlagSource { code: "us".into(), path: PathBuf::from("/flags/us.svg") },
        ];
        let table = render_table(&sources, 1_700_000_000);

        assert!(table.contains("pub const GENERATED_AT: u64 = 1700000000;"));
        assert!(table.contains("(\"de\", include_str!(\"/flags/de.svg\")),"));
        let de = table.find("    \"de\",").unwrap();
        let us = table.find("    \"us\",").unwrap();
        assert!(de < us);
    }

    #[test]
    fn test_render_table_is_deterministic_apart_from_timestamp() {
        let sources = vec![FlagSource { code: "it".into(), path: PathBuf::from("it.svg") }];
        let a = render_table(&sources, 1);
        let b = render_table(&sources, 2);
        fn strip(s: &str) -> Vec<&str> {
            s.lines().filter(|l| !l.contains("GENERATED_AT")).collect::<Vec<_>>()
        }
        assert_eq!(strip(&a), strip(&b));
    }
}
