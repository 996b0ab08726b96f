use std::{env, fs, path::Path};

/// Manifest `[package]` keys exported as `PKG_*` constants, with the value
/// used when a key is missing.
const EXPORTED: &[(&str, &str, &str)] = &[
    ("PKG_NAME", "name", "hundred-days"),
    ("PKG_VERSION", "version", "0.0.0"),
    ("PKG_DESCRIPTION", "description", ""),
    ("PKG_LICENSE", "license", "unlicensed"),
];

fn package_field<'a>(pkg: &'a toml::Table, key: &str, default: &'a str) -> &'a str {
    pkg.get(key).and_then(toml::Value::as_str).unwrap_or(default)
}

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    let manifest = Path::new(&manifest_dir).join("Cargo.toml");
    println!("cargo:rerun-if-changed={}", manifest.display());
    // The advice client bakes this in through `option_env!`.
    println!("cargo:rerun-if-env-changed=GEMINI_API_KEY");

    let content = fs::read_to_string(&manifest)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", manifest.display()));
    let parsed: toml::Table =
        toml::from_str(&content).unwrap_or_else(|e| panic!("Failed to parse Cargo.toml: {e}"));
    let pkg = parsed
        .get("package")
        .and_then(toml::Value::as_table)
        .expect("Cargo.toml missing [package]");

    let generated: String = EXPORTED
        .iter()
        .map(|(constant, key, default)| {
            format!(
                "pub const {constant}: &str = {:?};\n",
                package_field(pkg, key, default)
            )
        })
        .collect();

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    fs::write(Path::new(&out_dir).join("pkg_info.rs"), generated)
        .expect("Failed to write pkg_info.rs");
}
