//! Remote video URL resolution

use crate::error::VisionError;
use std::process::Command;
use tracing::{debug, info};
use url::Url;

const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com", "youtu.be"];

/// A page URL and the direct media URL it resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    pub source_url: String,
    pub stream_url: String,
}

pub trait StreamResolver: Send + Sync {
    fn resolve(&self, url: &str) -> Result<ResolvedStream, VisionError>;
}

/// Resolves YouTube pages through the `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    program: String,
    format: String,
}

impl YtDlpResolver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            format: "best".to_string(),
        }
    }
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl StreamResolver for YtDlpResolver {
    fn resolve(&self, url: &str) -> Result<ResolvedStream, VisionError> {
        let page = validate_youtube_url(url)?;
        debug!("Resolving {} with {}", page, self.program);

        let output = Command::new(&self.program)
            .arg("-f")
            .arg(&self.format)
            .arg("-g")
            .arg(page.as_str())
            .output()
            .map_err(|e| VisionError::Resolver(format!("Failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VisionError::Resolver(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stream_url = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| VisionError::Resolver(format!("No stream found for {}", url)))?;

        info!("Resolved {}", url);
        Ok(ResolvedStream {
            source_url: url.to_string(),
            stream_url: stream_url.to_string(),
        })
    }
}

/// Accept http(s) URLs on YouTube hosts only
pub fn validate_youtube_url(raw: &str) -> Result<Url, VisionError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| VisionError::Resolver(format!("Invalid URL '{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(VisionError::Resolver(format!("Unsupported URL scheme '{}'", url.scheme())));
    }

    match url.host_str() {
        Some(host) if YOUTUBE_HOSTS.contains(&host.to_ascii_lowercase().as_str()) => Ok(url),
        Some(host) => Err(VisionError::Resolver(format!("Not a YouTube host: {}", host))),
        None => Err(VisionError::Resolver(format!("URL has no host: {}", raw))),
    }
}
