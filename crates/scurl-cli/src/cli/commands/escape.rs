//! `scurl escape` / `scurl unescape`.

use anyhow::Result;
use std::io::{self, Write};

pub fn run_escape(text: &str) -> Result<()> {
    println!("{}", scurl_core::escape(text)?);
    Ok(())
}

/// Writes the decoded bytes as-is; they need not be UTF-8.
pub fn run_unescape(text: &str) -> Result<()> {
    let decoded = scurl_core::unescape(text)?;
    let mut out = io::stdout().lock();
    out.write_all(&decoded)?;
    out.write_all(b"\n")?;
    Ok(())
}
