//! `scurl get <url>`: single transfer to stdout or a file.

use anyhow::{Context, Result};
use scurl_core::config::ScurlConfig;
use scurl_core::Easy;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct GetArgs {
    pub url: String,
    pub output: Option<PathBuf>,
    pub headers: Vec<String>,
    pub insecure: bool,
    pub user_agent: Option<String>,
    pub no_follow: bool,
    pub sha256: bool,
}

/// Body sink shared with the write callback.
struct Sink {
    out: Box<dyn Write + Send>,
    hasher: Option<Sha256>,
    bytes: u64,
}

/// Builds an easy handle from config plus command-line overrides.
pub(super) fn configured_easy(cfg: &ScurlConfig, url: &str) -> Result<Easy> {
    let mut easy = Easy::new()?;
    cfg.transfer.apply(&mut easy).context("applying [transfer] config")?;
    easy.url(url).with_context(|| format!("invalid url {url}"))?;
    Ok(easy)
}

pub fn run_get(cfg: &ScurlConfig, args: &GetArgs) -> Result<()> {
    let mut easy = configured_easy(cfg, &args.url)?;
    easy.fail_on_error(true)?;
    if !args.headers.is_empty() {
        let headers: Vec<&String> = cfg.transfer.headers.iter().chain(&args.headers).collect();
        easy.http_headers(&headers)?;
    }
    if args.insecure {
        easy.ssl_verify_peer(false)?;
        easy.ssl_verify_host(false)?;
    }
    if let Some(ua) = &args.user_agent {
        easy.user_agent(ua)?;
    }
    if args.no_follow {
        easy.follow_location(false)?;
    }

    let out: Box<dyn Write + Send> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    let sink = Arc::new(Mutex::new(Sink {
        out,
        hasher: args.sha256.then(Sha256::new),
        bytes: 0,
    }));

    let writer = Arc::clone(&sink);
    easy.write_function(move |data| {
        let mut sink = writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = sink.out.write_all(data) {
            tracing::error!("writing body failed: {}", e);
            return Ok(0);
        }
        if let Some(h) = sink.hasher.as_mut() {
            h.update(data);
        }
        sink.bytes += data.len() as u64;
        Ok(data.len())
    })?;

    tracing::info!(url = %args.url, "get");
    easy.perform()
        .with_context(|| format!("transfer of {} failed", args.url))?;

    let mut sink = sink.lock().unwrap_or_else(|e| e.into_inner());
    sink.out.flush()?;
    let code = easy.response_code()?;
    let elapsed = easy.total_time()?;
    tracing::info!(url = %args.url, code, bytes = sink.bytes, ?elapsed, "get finished");
    eprintln!(
        "{} {} bytes in {:.2}s",
        code,
        sink.bytes,
        elapsed.as_secs_f64()
    );

    if let Some(hasher) = sink.hasher.take() {
        let digest = hex::encode(hasher.finalize());
        match &args.output {
            Some(path) => println!("{}  {}", digest, path.display()),
            None => eprintln!("sha256 {}", digest),
        }
    }
    Ok(())
}
