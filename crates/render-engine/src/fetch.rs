//! Remote reference fetching.
//!
//! Prefers a site-aware extractor (`yt-dlp`) and falls back to a plain
//! streamed HTTP download.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use freepoop_common::config::{FetchConfig, ToolchainConfig};
use freepoop_common::error::{FreepoopError, FreepoopResult};

/// Materializes a reference into a local file.
pub trait Fetcher: Send + Sync {
    /// Download `reference` into `dest_dir` and return the local path.
    fn fetch(&self, reference: &str, dest_dir: &Path) -> FreepoopResult<PathBuf>;
}

/// Extractor-first, HTTP-fallback fetcher.
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    extractor: PathBuf,
    prefer_extractor: bool,
    timeout: Duration,
}

impl RemoteFetcher {
    pub fn new(toolchain: &ToolchainConfig, fetch: &FetchConfig) -> Self {
        Self {
            extractor: toolchain.yt_dlp.clone(),
            prefer_extractor: fetch.prefer_extractor,
            timeout: Duration::from_secs(fetch.timeout_secs),
        }
    }

    fn fetch_with_extractor(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, String> {
        let template = dest_dir.join("%(title)s.%(ext)s");
        let output = Command::new(&self.extractor)
            .arg("--no-part")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg("--no-playlist")
            .arg("--no-simulate")
            .arg("--print")
            .arg("after_move:filepath")
            .arg("-o")
            .arg(template.to_string_lossy().into_owned())
            .arg(url)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| format!("failed to spawn {}: {e}", self.extractor.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("{} exited {}: {}", self.extractor.display(), output.status, stderr.trim()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(path) = stdout
            .lines()
            .rev()
            .map(|line| PathBuf::from(line.trim()))
            .find(|p| p.is_file())
        {
            return Ok(path);
        }

        newest_file(dest_dir)
            .ok_or_else(|| "extractor reported success but produced no file".to_string())
    }

    fn fetch_with_http(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, String> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("freepoop/", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout)
            .build()
            .map_err(|e| format!("failed to create HTTP client: {e}"))?;

        let mut response = client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| format!("HTTP request failed: {e}"))?;

        let header = |name: reqwest::header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let disposition = header(reqwest::header::CONTENT_DISPOSITION);
        let content_type = header(reqwest::header::CONTENT_TYPE);

        let name = infer_filename(
            disposition.as_deref(),
            response.url().path(),
            content_type.as_deref(),
        );
        let dest = unique_destination(dest_dir, &name);

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&dest)
            .map_err(|e| format!("failed to create {}: {e}", dest.display()))?;
        if let Err(e) = std::io::copy(&mut response, &mut file) {
            let _ = fs::remove_file(&dest);
            return Err(format!("download interrupted: {e}"));
        }
        Ok(dest)
    }
}

impl Fetcher for RemoteFetcher {
    fn fetch(&self, reference: &str, dest_dir: &Path) -> FreepoopResult<PathBuf> {
        if !is_remote_reference(reference) {
            return Err(FreepoopError::fetch(
                reference,
                "not a local file and not an http(s) URL",
            ));
        }
        fs::create_dir_all(dest_dir)?;

        let mut failures = Vec::new();
        if self.prefer_extractor {
            match self.fetch_with_extractor(reference, dest_dir) {
                Ok(path) => {
                    tracing::info!(reference, path = %path.display(), "Fetched with extractor");
                    return Ok(path);
                }
                Err(e) => {
                    tracing::debug!(reference, error = %e, "Extractor failed, falling back to HTTP");
                    failures.push(format!("extractor: {e}"));
                }
            }
        }

        match self.fetch_with_http(reference, dest_dir) {
            Ok(path) => {
                tracing::info!(reference, path = %path.display(), "Fetched over HTTP");
                Ok(path)
            }
            Err(e) => {
                failures.push(format!("http: {e}"));
                Err(FreepoopError::fetch(reference, failures.join("; ")))
            }
        }
    }
}

/// Whether `reference` looks like an http(s) URL.
pub fn is_remote_reference(reference: &str) -> bool {
    let lower = reference.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Pick a local file name for a download.
///
/// `Content-Disposition` wins, then the last URL path segment, then
/// `download`. An extension-less name gets the content-type subtype when it
/// is short.
pub fn infer_filename(
    content_disposition: Option<&str>,
    url_path: &str,
    content_type: Option<&str>,
) -> String {
    let from_header = content_disposition.and_then(|value| {
        disposition_regex()?
            .captures(value)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    });
    let from_url = url_path
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string);

    let raw = from_header
        .filter(|s| !s.is_empty())
        .or(from_url)
        .unwrap_or_else(|| "download".to_string());
    let mut name = safe_filename(&raw);

    if Path::new(&name).extension().is_none() {
        if let Some(subtype) = content_type
            .and_then(|ct| ct.split(';').next())
            .and_then(|ct| ct.split('/').nth(1))
            .map(str::trim)
            .filter(|s| !s.is_empty() && s.len() <= 5 && s.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            name.push('.');
            name.push_str(subtype);
        }
    }
    name
}

/// Strip path separators and unusual characters from a file name.
pub fn safe_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter_map(|c| match c {
            '/' | '\\' => Some('_'),
            c if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') => Some(c),
            c if c.is_whitespace() => Some(' '),
            _ => None,
        })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `dest_dir/name`, or `stem-N.ext` with the first free `N` when that file
/// already exists.
pub fn unique_destination(dest_dir: &Path, name: &str) -> PathBuf {
    let candidate = dest_dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());
    (1..)
        .map(|n| match &ext {
            Some(ext) => dest_dir.join(format!("{stem}-{n}.{ext}")),
            None => dest_dir.join(format!("{stem}-{n}")),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

fn disposition_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)filename\*?=(?:UTF-8'')?["']?([^"';]+)"#).ok())
        .as_ref()
}

fn newest_file(dir: &Path) -> Option<PathBuf> {
    fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| {
            let modified = entry.metadata().ok()?.modified().ok()?;
            Some((modified, entry.path()))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
}
