//! Export bundles and the favicon package built from them.
//!
//! An [`ExportBundle`] holds one render per required size. An
//! [`ExportPackage`] turns a bundle into the files a website needs: the ICO,
//! the PNG variants, the web app manifest and a setup guide.
//!
//! | file                         | source size |
//! |------------------------------|-------------|
//! | `favicon.ico`                | 32x32       |
//! | `favicon-16x16.png`          | 16x16       |
//! | `favicon-32x32.png`          | 32x32       |
//! | `favicon-64x64.png`          | 64x64       |
//! | `apple-touch-icon.png`       | 180x180     |
//! | `android-chrome-192x192.png` | 192x192     |
//! | `android-chrome-512x512.png` | 512x512     |
//! | `manifest.json`              | generated   |
//! | `setup-guide.html`           | generated   |

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::color::HexColor;
use crate::config::{BackgroundMode, StyleConfig};
use crate::surface::{RasterSurface, encode};

/// Every size rendered for export, in pixels.
pub const REQUIRED_SIZES: [u32; 9] = [16, 32, 48, 64, 128, 180, 192, 256, 512];

/// PNG files in the package and the size each one is taken from.
const PNG_FILES: [(&str, u32); 6] = [
    ("favicon-16x16.png", 16),
    ("favicon-32x32.png", 32),
    ("favicon-64x64.png", 64),
    ("apple-touch-icon.png", 180),
    ("android-chrome-192x192.png", 192),
    ("android-chrome-512x512.png", 512),
];

const ICO_FILE: &str = "favicon.ico";
const ICO_SIZE: u32 = 32;
const MANIFEST_FILE: &str = "manifest.json";
const GUIDE_FILE: &str = "setup-guide.html";

/// Sizes listed as manifest icons.
const MANIFEST_ICON_SIZES: [u32; 2] = [192, 512];

/// The label of a square size, such as `"32x32"`.
pub fn size_label(size: u32) -> String {
    format!("{size}x{size}")
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode image")]
    Encode(#[from] image::ImageError),

    #[error("failed to serialize manifest")]
    Manifest(#[from] serde_json::Error),

    #[error("export bundle has no {0} render")]
    MissingSize(String),

    /// The target cannot receive individual files.
    #[error("cannot write files to {}: not a writable directory, download the archive instead", .0.display())]
    DirectoryUnavailable(PathBuf),
}

// ============================================================================
// ExportBundle
// ============================================================================

/// One rendered size of an [`ExportBundle`].
#[derive(Debug, Clone, PartialEq)]
pub struct BundleEntry {
    pub size: u32,
    pub image: RgbaImage,

    /// PNG encoding of `image`.
    pub png: Vec<u8>,
}

impl BundleEntry {
    pub fn label(&self) -> String {
        size_label(self.size)
    }
}

/// Rendered images for a set of sizes, keyed by size label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportBundle {
    entries: BTreeMap<u32, BundleEntry>,
}

impl ExportBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes and stores a rendered surface, replacing any entry of the
    /// same logical size.
    pub fn insert(&mut self, surface: &RasterSurface) -> Result<(), ExportError> {
        let image = surface.to_rgba_image();
        let png = encode(&image, ImageFormat::Png)?;
        let size = surface.size();
        self.entries.insert(size, BundleEntry { size, image, png });
        Ok(())
    }

    /// Looks up an entry by label, such as `"180x180"`.
    pub fn get(&self, label: &str) -> Option<&BundleEntry> {
        let (width, height) = label.split_once('x')?;
        if width != height {
            return None;
        }
        self.by_size(width.parse().ok()?)
    }

    pub fn by_size(&self, size: u32) -> Option<&BundleEntry> {
        self.entries.get(&size)
    }

    /// Labels of all entries in ascending size order.
    pub fn labels(&self) -> Vec<String> {
        self.entries.keys().copied().map(size_label).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BundleEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if every size in [`REQUIRED_SIZES`] is present.
    pub fn is_complete(&self) -> bool {
        REQUIRED_SIZES.iter().all(|size| self.entries.contains_key(size))
    }

    fn require(&self, size: u32) -> Result<&BundleEntry, ExportError> {
        self.by_size(size)
            .ok_or_else(|| ExportError::MissingSize(size_label(size)))
    }
}

// ============================================================================
// Manifest
// ============================================================================

/// The web app manifest written as `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebManifest {
    pub name: String,
    pub short_name: String,
    pub icons: Vec<ManifestIcon>,
    pub theme_color: HexColor,
    pub background_color: HexColor,
    pub display: String,
    pub start_url: String,
    pub scope: String,
    pub orientation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub purpose: String,
}

impl WebManifest {
    /// Builds the manifest for a design named `content_name`.
    pub fn new(content_name: &str, background: HexColor) -> Self {
        let icons = MANIFEST_ICON_SIZES
            .iter()
            .map(|&size| ManifestIcon {
                src: format!("/android-chrome-{}.png", size_label(size)),
                sizes: size_label(size),
                mime_type: "image/png".to_string(),
                purpose: "any maskable".to_string(),
            })
            .collect();

        Self {
            name: format!("{content_name} - Premium Favicon"),
            short_name: content_name.to_string(),
            icons,
            theme_color: background,
            background_color: background,
            display: "standalone".to_string(),
            start_url: "/".to_string(),
            scope: "/".to_string(),
            orientation: "portrait".to_string(),
        }
    }
}

/// The HTML page explaining which tags to add to a site's `<head>`.
pub fn setup_guide(theme_color: HexColor) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Favicon Setup Guide</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 40px auto; max-width: 800px; line-height: 1.6; }}
        h1 {{ color: #333; }}
        pre {{ background: #f5f5f5; padding: 15px; border-radius: 5px; overflow-x: auto; }}
    </style>
</head>
<body>
    <h1>Favicon Setup Guide</h1>
    <h2>HTML Implementation</h2>
    <pre><code>&lt;link rel="icon" type="image/x-icon" href="/favicon.ico"&gt;
&lt;link rel="icon" type="image/png" sizes="16x16" href="/favicon-16x16.png"&gt;
&lt;link rel="icon" type="image/png" sizes="32x32" href="/favicon-32x32.png"&gt;
&lt;link rel="apple-touch-icon" sizes="180x180" href="/apple-touch-icon.png"&gt;
&lt;link rel="manifest" href="/manifest.json"&gt;
&lt;meta name="theme-color" content="{theme_color}"&gt;</code></pre>
</body>
</html>"#
    )
}

// ============================================================================
// ExportPackage
// ============================================================================

/// A named file in an [`ExportPackage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    pub name: String,
    pub contents: Vec<u8>,
}

/// Result of writing a package into a directory.
#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,

    /// Files that could not be written. The rest of the batch still ran.
    pub failed: Vec<(PathBuf, io::Error)>,
}

impl WriteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The complete set of files for one favicon design.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPackage {
    content_name: String,
    mode: BackgroundMode,
    manifest: WebManifest,
    files: Vec<PackageFile>,
}

impl ExportPackage {
    /// Assembles the package from a bundle rendered with `config`.
    pub fn assemble(bundle: &ExportBundle, config: &StyleConfig) -> Result<Self, ExportError> {
        let content_name = config.content_name();
        let manifest = WebManifest::new(&content_name, config.background);

        let mut files = Vec::with_capacity(PNG_FILES.len() + 3);
        files.push(PackageFile {
            name: ICO_FILE.to_string(),
            contents: encode(&bundle.require(ICO_SIZE)?.image, ImageFormat::Ico)?,
        });
        for (name, size) in PNG_FILES {
            files.push(PackageFile {
                name: name.to_string(),
                contents: bundle.require(size)?.png.clone(),
            });
        }
        files.push(PackageFile {
            name: MANIFEST_FILE.to_string(),
            contents: serde_json::to_string_pretty(&manifest)?.into_bytes(),
        });
        files.push(PackageFile {
            name: GUIDE_FILE.to_string(),
            contents: setup_guide(config.background).into_bytes(),
        });

        Ok(Self {
            content_name,
            mode: config.mode,
            manifest,
            files,
        })
    }

    pub fn files(&self) -> &[PackageFile] {
        &self.files
    }

    pub fn file(&self, name: &str) -> Option<&PackageFile> {
        self.files.iter().find(|file| file.name == name)
    }

    pub fn manifest(&self) -> &WebManifest {
        &self.manifest
    }

    /// Suggested archive file name, `favicon-<content>-<mode>.zip`.
    pub fn archive_name(&self) -> String {
        format!("favicon-{}-{}.zip", self.content_name, self.mode.as_str())
    }

    /// Writes every file into `dir`.
    ///
    /// Fails only if `dir` is not an existing directory. A file that cannot
    /// be written is logged and recorded in the report; the remaining files
    /// are still written.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<WriteReport, ExportError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ExportError::DirectoryUnavailable(dir.to_path_buf()));
        }

        info!(dir = %dir.display(), files = self.files.len(), "Writing favicon package");
        let mut report = WriteReport::default();
        for file in &self.files {
            let path = dir.join(&file.name);
            match fs::write(&path, &file.contents) {
                Ok(()) => report.written.push(path),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Failed to write package file");
                    report.failed.push((path, err));
                }
            }
        }
        info!(written = report.written.len(), failed = report.failed.len(), "Favicon package written");

        Ok(report)
    }
}
