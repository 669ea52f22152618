//! On-disk instrumentation cache
//!
//! Layout:
//!
//! ```text
//! <root>/<host>/<hash>/<name>.<ext>        instrumented artifact
//! <root>/<host>/<hash>/<name>.<ext>.src    normalized source handed to the tool
//! <root>/<host>/<hash>/<name>.<ext>.json   artifact metadata
//! ```
//!
//! The artifact's presence is the only hit/miss signal. Nothing is ever
//! evicted. Concurrent misses on one key may both run the tool; each run
//! writes a private staging file that is renamed onto the artifact path, so
//! readers only ever see complete artifacts and the last writer wins.

use super::key::{artifact_name, ArtifactKind, CacheKey};
use super::tool::{InstrumentJob, Instrumenter};
use crate::config::InstrumentConfig;
use crate::encoding::normalize;
use crate::error::{ProxyError, ProxyResult};
use crate::flow::Request;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Metadata written next to each artifact on a miss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMeta {
    /// Original URL of the flow that produced the artifact
    pub url: String,
    pub kind: String,
    pub mode: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful instrumentation
#[derive(Debug, Clone)]
pub struct Instrumented {
    pub body: Vec<u8>,
    /// Served from an existing artifact without running the tool
    pub hit: bool,
    pub artifact: PathBuf,
}

/// One artifact found on disk
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub host: String,
    pub hash: String,
    pub artifact: PathBuf,
    pub meta: Option<ArtifactMeta>,
}

/// Content-addressed store of instrumented artifacts
pub struct InstrumentationCache {
    root: PathBuf,
    use_cache: bool,
    mode: String,
    tool: Arc<dyn Instrumenter>,
}

impl InstrumentationCache {
    /// Create a cache from configuration and an instrumentation backend
    pub fn new(config: &InstrumentConfig, tool: Arc<dyn Instrumenter>) -> Self {
        Self {
            root: config.cache_dir.clone(),
            use_cache: config.use_cache,
            mode: config.mode.clone(),
            tool,
        }
    }

    /// Cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Instrument `body` for the flow's request, reusing a cached artifact
    /// when caching is enabled.
    ///
    /// Errors leave the response untouched; the caller decides to pass the
    /// original body through.
    pub async fn instrument(
        &self,
        request: &Request,
        body: &[u8],
        kind: ArtifactKind,
    ) -> ProxyResult<Instrumented> {
        let source = normalize(body);
        let host = request.host();
        let key = CacheKey::new(host.as_deref(), &source);
        let name = artifact_name(&request.path_components());
        let dir = key.dir(&self.root);
        let artifact = dir.join(format!("{}.{}", name, kind.ext()));
        let url = request.original_url();

        if self.use_cache && is_file(&artifact).await {
            info!("Cache hit: {} from {}", artifact.display(), url);
            let body = fs::read(&artifact).await.map_err(|e| {
                ProxyError::io(format!("reading artifact {}", artifact.display()), e)
            })?;
            return Ok(Instrumented {
                body,
                hit: true,
                artifact,
            });
        }

        debug!("Cache miss: {} from {}", artifact.display(), url);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ProxyError::io(format!("creating {}", dir.display()), e))?;

        let source_path = dir.join(format!("{}.{}.src", name, kind.ext()));
        fs::write(&source_path, &source)
            .await
            .map_err(|e| ProxyError::io(format!("writing {}", source_path.display()), e))?;

        let staging = dir.join(format!(
            ".{}.{}.{}-{}.tmp",
            name,
            kind.ext(),
            std::process::id(),
            STAGING_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        let job = InstrumentJob {
            kind,
            source: &source,
            output: &staging,
            mode: &self.mode,
            url,
        };

        let body = match self.publish(&job, &artifact).await {
            Ok(body) => body,
            Err(e) => {
                let _ = fs::remove_file(&staging).await;
                return Err(e);
            }
        };

        self.write_meta(&artifact, kind, url).await;
        Ok(Instrumented {
            body,
            hit: false,
            artifact,
        })
    }

    /// Run the tool into the staging path and move the result into place
    async fn publish(&self, job: &InstrumentJob<'_>, artifact: &Path) -> ProxyResult<Vec<u8>> {
        self.tool.instrument(job).await?;

        let body = match fs::read(job.output).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProxyError::MissingArtifact(artifact.to_path_buf()))
            }
            Err(e) => {
                return Err(ProxyError::io(
                    format!("reading {}", job.output.display()),
                    e,
                ))
            }
        };

        fs::rename(job.output, artifact)
            .await
            .map_err(|e| ProxyError::io(format!("publishing {}", artifact.display()), e))?;
        Ok(body)
    }

    async fn write_meta(&self, artifact: &Path, kind: ArtifactKind, url: &str) {
        let meta = ArtifactMeta {
            url: url.to_string(),
            kind: kind.ext().to_string(),
            mode: self.mode.clone(),
            created_at: Utc::now(),
        };
        let path = meta_path(artifact);

        let content = match serde_json::to_string_pretty(&meta) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize artifact metadata: {}", e);
                return;
            }
        };
        if let Err(e) = fs::write(&path, content).await {
            warn!("Failed to write {}: {}", path.display(), e);
        }
    }
}

fn meta_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

fn is_artifact_file(name: &str) -> bool {
    name.ends_with(".html") || name.ends_with(".js")
}

async fn subdirs(dir: &Path) -> ProxyResult<Vec<(String, PathBuf)>> {
    let mut out = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| ProxyError::io(format!("listing {}", dir.display()), e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ProxyError::io(format!("listing {}", dir.display()), e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| ProxyError::io(format!("inspecting {}", entry.path().display()), e))?;
        if file_type.is_dir() {
            out.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }
    out.sort();
    Ok(out)
}

/// Enumerate every artifact under a cache root
pub async fn list_entries(root: &Path) -> ProxyResult<Vec<CacheEntry>> {
    let exists = fs::try_exists(root)
        .await
        .map_err(|e| ProxyError::io(format!("checking {}", root.display()), e))?;
    if !exists {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for (host, host_dir) in subdirs(root).await? {
        for (hash, hash_dir) in subdirs(&host_dir).await? {
            let mut files = fs::read_dir(&hash_dir)
                .await
                .map_err(|e| ProxyError::io(format!("listing {}", hash_dir.display()), e))?;
            let mut artifacts = Vec::new();
            while let Some(file) = files
                .next_entry()
                .await
                .map_err(|e| ProxyError::io(format!("listing {}", hash_dir.display()), e))?
            {
                if is_artifact_file(&file.file_name().to_string_lossy()) {
                    artifacts.push(file.path());
                }
            }
            artifacts.sort();

            for artifact in artifacts {
                let meta = match fs::read_to_string(meta_path(&artifact)).await {
                    Ok(content) => serde_json::from_str(&content).ok(),
                    Err(_) => None,
                };
                entries.push(CacheEntry {
                    host: host.clone(),
                    hash: hash.clone(),
                    artifact,
                    meta,
                });
            }
        }
    }

    debug!("Found {} cache entries under {}", entries.len(), root.display());
    Ok(entries)
}
