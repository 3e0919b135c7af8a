//! `scurl fetch <url>... --dir DIR`: concurrent downloads over one multi handle.

use anyhow::{bail, Context, Result};
use scurl_core::config::ScurlConfig;
use scurl_core::{Easy, EasyId, Multi};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::get::configured_easy;

#[derive(Debug, Clone)]
pub struct FetchArgs {
    pub urls: Vec<String>,
    pub dir: PathBuf,
    pub max_total: Option<usize>,
    pub max_host: Option<usize>,
}

/// Extracts the last path segment from a URL for use as a filename.
///
/// Returns `None` if the URL cannot be parsed or the path is empty/root.
fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = scurl_core::unescape_str(segment).ok()?;
    if decoded == "." || decoded == ".." || decoded.contains('/') {
        return None;
    }
    Some(decoded)
}

/// Picks a file name for `url` that is not in `taken`: the URL's last
/// segment, else `download`, with `.1`, `.2`... appended on collision.
fn unique_name(url: &str, taken: &mut HashSet<String>) -> String {
    let base = filename_from_url_path(url).unwrap_or_else(|| "download".to_string());
    let mut name = base.clone();
    let mut n = 1;
    while !taken.insert(name.clone()) {
        name = format!("{}.{}", base, n);
        n += 1;
    }
    name
}

struct Job {
    url: String,
    path: PathBuf,
}

fn prepare(cfg: &ScurlConfig, url: &str, path: &Path) -> Result<Easy> {
    let mut easy = configured_easy(cfg, url)?;
    easy.fail_on_error(true)?;
    let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    easy.write_function(move |data| match file.write_all(data) {
        Ok(()) => Ok(data.len()),
        Err(e) => {
            tracing::error!("writing body failed: {}", e);
            Ok(0)
        }
    })?;
    Ok(easy)
}

/// Removes the output of a transfer that did not complete.
fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), "could not remove partial file: {}", e);
    }
}

pub fn run_fetch(cfg: &ScurlConfig, args: &FetchArgs) -> Result<()> {
    fs::create_dir_all(&args.dir)
        .with_context(|| format!("create {}", args.dir.display()))?;

    let mut taken = HashSet::new();
    let mut jobs: Vec<Job> = Vec::with_capacity(args.urls.len());
    let mut easies = Vec::with_capacity(args.urls.len());
    for url in &args.urls {
        let path = args.dir.join(unique_name(url, &mut taken));
        let easy = match prepare(cfg, url, &path) {
            Ok(easy) => easy,
            Err(e) => {
                for job in &jobs {
                    discard(&job.path);
                }
                return Err(e);
            }
        };
        easies.push(easy);
        jobs.push(Job {
            url: url.clone(),
            path,
        });
    }

    let mut multi = Multi::new()?;
    cfg.multi.apply(&mut multi).context("applying [multi] config")?;
    if let Some(n) = args.max_total {
        multi.set_max_total_connections(n)?;
    }
    if let Some(n) = args.max_host {
        multi.set_max_host_connections(n)?;
    }

    let mut by_id: HashMap<EasyId, &Job> = HashMap::new();
    for (easy, job) in easies.iter_mut().zip(&jobs) {
        let id = multi.add(easy)?;
        by_id.insert(id, job);
    }
    tracing::info!(transfers = by_id.len(), "fetch started");

    let mut failed = 0usize;
    loop {
        let running = multi.perform()?;
        for done in multi.get_done() {
            let Some(job) = by_id.get(&done.id) else {
                continue;
            };
            match done.result {
                Ok(()) => println!("ok      {} -> {}", job.url, job.path.display()),
                Err(e) => {
                    failed += 1;
                    tracing::warn!(url = %job.url, "transfer failed: {}", e);
                    println!("failed  {}: {}", job.url, e);
                    discard(&job.path);
                }
            }
        }
        if running == 0 {
            break;
        }
        multi.wait(Duration::from_millis(500))?;
    }
    drop(multi);

    if failed > 0 {
        bail!("{} of {} transfers failed", failed, jobs.len());
    }
    Ok(())
}
