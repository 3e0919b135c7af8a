//! `scurl head <url>`: response headers of a HEAD request.

use anyhow::{Context, Result};
use scurl_core::config::ScurlConfig;
use scurl_core::{Header, Origin};

use super::get::configured_easy;

pub fn run_head(cfg: &ScurlConfig, url: &str, name: Option<&str>, json: bool) -> Result<()> {
    let mut easy = configured_easy(cfg, url)?;
    easy.nobody(true)?;
    easy.write_function(|data| Ok(data.len()))?;
    easy.perform()
        .with_context(|| format!("HEAD {} failed", url))?;
    let code = easy.response_code()?;

    let headers: Vec<Header> = match name {
        Some(name) => vec![easy
            .header(name)
            .with_context(|| format!("header {} not in response", name))?],
        None => easy.headers(Origin::HEADER, -1),
    };

    if json {
        let doc = serde_json::json!({
            "status": code,
            "url": easy.effective_url()?,
            "headers": headers,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else if name.is_some() {
        for h in &headers {
            println!("{}", h.value);
        }
    } else {
        println!("status: {}", code);
        for h in &headers {
            println!("{}", h);
        }
    }
    Ok(())
}
