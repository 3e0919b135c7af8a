use anyhow::Result;

pub fn run_version() -> Result<()> {
    println!("scurl {}", env!("CARGO_PKG_VERSION"));
    println!("{}", scurl_core::version_info());
    Ok(())
}
