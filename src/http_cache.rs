use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "fixturecast";
const CACHE_FILE: &str = "http_cache.json";

static STORE: Mutex<Option<ResponseCache>> = Mutex::new(None);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ResponseCache {
    version: u32,
    entries: HashMap<String, CachedResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedResponse {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

/// GET with conditional-request caching. A 304 revalidation serves the
/// cached body, which keeps the scheduled jobs polite to the fixtures API.
pub fn fetch_json_cached(client: &Client, url: &str) -> Result<String> {
    let known = with_store(|store| store.entries.get(url).cloned());

    let mut req = client.get(url);
    if let Some(entry) = known.as_ref() {
        if let Some(etag) = entry.etag.as_deref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(stamp) = entry.last_modified.as_deref() {
            req = req.header(IF_MODIFIED_SINCE, stamp);
        }
    }

    let resp = req.send().context("request failed")?;
    let status = resp.status();

    if status == StatusCode::NOT_MODIFIED {
        let entry = known.ok_or_else(|| anyhow!("received 304 without a cached body"))?;
        remember(url, entry.clone());
        return Ok(entry.body);
    }

    let etag = header_string(&resp, ETAG);
    let last_modified = header_string(&resp, LAST_MODIFIED);
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow!("http {status}: {body}"));
    }

    remember(
        url,
        CachedResponse {
            body: body.clone(),
            etag,
            last_modified,
            fetched_at: unix_now(),
        },
    );
    Ok(body)
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn header_string(resp: &reqwest::blocking::Response, name: HeaderName) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn remember(url: &str, entry: CachedResponse) {
    with_store(|store| {
        store.version = CACHE_VERSION;
        store.entries.insert(url.to_string(), entry);
        let _ = persist(store);
    });
}

fn with_store<T>(f: impl FnOnce(&mut ResponseCache) -> T) -> T {
    let mut guard = STORE.lock().expect("http cache lock poisoned");
    let store = guard.get_or_insert_with(load);
    f(store)
}

fn load() -> ResponseCache {
    let Some(path) = cache_path() else {
        return ResponseCache::default();
    };
    let Ok(raw) = fs::read_to_string(path) else {
        return ResponseCache::default();
    };
    let cache = serde_json::from_str::<ResponseCache>(&raw).unwrap_or_default();
    if cache.version != CACHE_VERSION {
        return ResponseCache::default();
    }
    cache
}

fn persist(cache: &ResponseCache) -> Result<()> {
    let Some(path) = cache_path() else {
        return Ok(());
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok();
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(cache).context("serialize http cache")?;
    fs::write(&tmp, json).context("write http cache")?;
    fs::rename(&tmp, &path).context("swap http cache")?;
    Ok(())
}

fn cache_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(CACHE_FILE))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
