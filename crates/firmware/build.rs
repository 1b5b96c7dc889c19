fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only run linker script setup for hardware builds
    #[cfg(feature = "hardware")]
    {
        use std::env;
        use std::fs;
        use std::path::PathBuf;

        // Host builds with `--features hardware` (clippy, docs) have nothing to link.
        if env::var("CARGO_CFG_TARGET_ARCH").as_deref() == Ok("riscv32") {
            // Put `memory.x` in our output directory and ensure it's on the linker search path.
            let out = PathBuf::from(env::var_os("OUT_DIR").ok_or("OUT_DIR not set")?);
            fs::write(out.join("memory.x"), include_bytes!("memory.x"))?;

            println!("cargo:rustc-link-search={}", out.display());
            // riscv-rt's link.x includes memory.x; defmt.x places the log strings.
            println!("cargo:rustc-link-arg-bins=-Tlink.x");
            println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
        }

        println!("cargo:rerun-if-changed=memory.x");
    }

    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}
