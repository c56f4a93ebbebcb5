fn main() {
    let arch = std::env::var("CARGO_CFG_TARGET_ARCH").unwrap();
    let dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();

    match arch.as_str() {
        "arm" => {
            // cortex-m-rt's link.x pulls in memory.x from the search path
            println!("cargo:rustc-link-search={dir}");
            println!("cargo:rustc-link-arg-bins=-Tlink.x");
            println!("cargo:rerun-if-changed={dir}/memory.x");
        }
        _ => {
            // Host build: library and tests only, no linker script
        }
    }
}
