// Pass BIOSURV_VERSION through to the binary, falling back to the crate version

fn main() {
    println!("cargo:rerun-if-env-changed=BIOSURV_VERSION");
    let version = match std::env::var("BIOSURV_VERSION") {
        Ok(v) if !v.trim().is_empty() => v,
        _ => env!("CARGO_PKG_VERSION").to_string(),
    };
    println!("cargo:rustc-env=BIOSURV_VERSION={}", version);
}
