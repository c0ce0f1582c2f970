//! Build script for procbridge-core
//!
//! Checks the toolchain before compilation:
//! - Minimum Rust version (`split_first_chunk` and `CStr::from_bytes_until_nul`
//!   need Rust 1.77.0+)
//! - Whether the target has process queries beyond the capability flags

fn main()
{
    println!("cargo:rerun-if-changed=build.rs");

    if let Ok(rustc_version) = rustc_version::version() {
        let min_rust_version = rustc_version::Version::new(1, 77, 0);

        if rustc_version < min_rust_version {
            panic!(
                "procbridge-core requires Rust {} or newer, found {}",
                min_rust_version, rustc_version
            );
        }
    } else {
        // If we can't get version (e.g., in some build environments), just warn
        println!("cargo:warning=could not verify Rust version");
    }

    // Host cfg! would describe the build machine, so read the target from Cargo.
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let target_family = std::env::var("CARGO_CFG_TARGET_FAMILY").unwrap_or_default();
    if !matches!(target_os.as_str(), "linux" | "macos") {
        if target_family.split(',').any(|f| f == "unix") {
            println!("cargo:warning=procbridge-core: only pid_exists and readlink are available on {target_os}");
        } else {
            println!("cargo:warning=procbridge-core: only capability flags are available on {target_os}");
        }
    }
}
