/// windump build script.
///
/// Only reports which backend the target gets; nothing is compiled here.
fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // The native backend is Windows-only. Other targets still build, but
    // every capture call lands in the no-op stub, so say so once.
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "windows" {
        println!(
            "cargo:warning=windump: target_os = {target_os:?}, \
             crash-dump capture compiles to a no-op"
        );
    }
}
