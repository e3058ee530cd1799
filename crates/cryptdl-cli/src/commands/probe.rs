//! Probe command - load the native libraries and report on them

use super::Session;
use anyhow::Result;
use cryptdl::dl::loader::LibraryOptions;
use cryptdl::ABI_MODEL;

pub fn run(session: &Session, json: bool) -> Result<()> {
    let bindings = session.bindings()?;
    let options = LibraryOptions::resolve();
    let capabilities = bindings.capabilities();

    if json {
        let report = serde_json::json!({
            "abi": ABI_MODEL.to_string(),
            "cryptsetup": options.cryptsetup,
            "libc": options.libc,
            "capabilities": capabilities,
            "version": cryptdl::VERSION,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("libcryptsetup: {}", options.cryptsetup);
    println!("C runtime:     {}", options.libc);
    println!("ABI model:     {}", ABI_MODEL);
    if capabilities.is_empty() {
        println!("Optional:      none");
    } else {
        println!("Optional:      {}", capabilities.join(", "));
    }
    Ok(())
}
