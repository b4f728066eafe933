//! Per-release `latest-mac.yml` manifest written by electron-builder.

use serde::{Deserialize, Serialize};

use release_utils::format_size;

use crate::error::{ResolveError, Result};

pub const ARCH_X64: &str = "x64";
pub const ARCH_ARM64: &str = "arm64";

const ARM64_SUFFIX: &str = "-arm64.dmg";
const X64_SUFFIX: &str = ".dmg";

#[derive(Debug, Deserialize)]
struct ManifestDocument {
    files: Vec<ManifestFile>,
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    url: String,
    sha512: String,
    size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub download: String,
    pub sha512: String,
    /// Human readable, e.g. "85.3 MB".
    pub size: String,
}

/// Installer per architecture. x64 is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseFiles {
    pub x64: FileMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arm64: Option<FileMeta>,
}

impl ReleaseFiles {
    pub fn get(&self, arch: &str) -> Option<&FileMeta> {
        match arch {
            ARCH_X64 => Some(&self.x64),
            ARCH_ARM64 => self.arm64.as_ref(),
            _ => None,
        }
    }
}

/// Parses a manifest; relative file urls are resolved against `download_base`.
pub fn parse_manifest(yaml: &str, download_base: &str) -> Result<ReleaseFiles> {
    let document: ManifestDocument = serde_yaml_ng::from_str(yaml)
        .map_err(|e| ResolveError::malformed(format!("Invalid release manifest ({})", e), &yaml))?;

    let mut x64 = None;
    let mut arm64 = None;
    for file in document.files {
        let slot = if file.url.ends_with(ARM64_SUFFIX) {
            &mut arm64
        } else if file.url.ends_with(X64_SUFFIX) {
            &mut x64
        } else {
            continue;
        };
        if slot.is_none() {
            *slot = Some(FileMeta {
                download: join_url(download_base, &file.url),
                sha512: file.sha512,
                size: format_size(file.size),
            });
        }
    }

    let x64 = x64.ok_or_else(|| ResolveError::malformed("Release manifest has no x64 installer", &yaml))?;
    Ok(ReleaseFiles { x64, arm64 })
}

fn join_url(base: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
    }
}
