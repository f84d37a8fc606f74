use std::path::PathBuf;

/// Split `/path/to/lib1:/path/to/lib2` into individual paths.
fn split_search_paths(paths: &str) -> Vec<String> {
    let split_char = if cfg!(windows) { ";" } else { ":" };
    paths.split(split_char).filter(|path| !path.is_empty()).map(|path| path.to_string()).collect()
}

/// Library directories below environment-provided and system prefixes that exist on this machine.
fn openblas_search_paths() -> Vec<PathBuf> {
    let env_candidates = ["OPENBLAS_DIR", "LD_LIBRARY_PATH", "DYLD_LIBRARY_PATH"];
    let system_roots = ["/usr", "/usr/local", "/opt"];
    let lib_dirs = ["", "lib", "lib64", "lib/x86_64-linux-gnu"];

    env_candidates
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .flat_map(|paths| split_search_paths(&paths))
        .chain(system_roots.iter().map(|root| root.to_string()))
        .map(PathBuf::from)
        .flat_map(|root| lib_dirs.iter().map(move |lib| root.join(lib)))
        .filter(|path| path.exists())
        .filter_map(|path| std::fs::canonicalize(path).ok())
        .collect()
}

fn main() {
    println!("cargo:rerun-if-env-changed=OPENBLAS_DIR");

    if std::env::var_os("CARGO_FEATURE_USE_OPENBLAS").is_none() {
        return;
    }
    for path in openblas_search_paths() {
        println!("cargo:rustc-link-search=native={}", path.display());
    }
    println!("cargo:rustc-link-lib=openblas");
    println!("cargo:rustc-link-lib=gomp");
}
