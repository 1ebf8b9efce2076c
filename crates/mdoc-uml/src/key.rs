//! Content-addressed image naming.
//!
//! Provides [`DiagramKey`] for deriving the image filename from diagram text
//! and [`ImageLocation`] for placing that file inside an output directory.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Subdirectory that holds images for builders with relocatable image paths.
pub const IMAGE_DIR: &str = "_images";

/// Diagram source used as a cache key.
///
/// Only the text participates in the key: the renderer command and its
/// version do not, so an existing image is reused even after an upgrade.
#[derive(Debug, Clone, Copy)]
pub struct DiagramKey<'a> {
    /// Diagram source text as authored.
    pub source: &'a str,
}

impl<'a> DiagramKey<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    /// SHA-256 of the UTF-8 source, hex-encoded (64 characters).
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source.as_bytes());
        let result = hasher.finalize();
        hex::encode(result)
    }

    /// Image filename: `plantuml-{hash}.png`.
    #[must_use]
    pub fn filename(&self) -> String {
        format!("plantuml-{}.png", self.compute_hash())
    }
}

/// Where a rendered image lives and how markup refers to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLocation {
    /// Reference emitted into the output document.
    pub refname: String,
    /// File path on disk.
    pub path: PathBuf,
}

impl ImageLocation {
    /// Derive the location of `key` under `out_dir`.
    ///
    /// With an `image_dir` the file goes into that subdirectory and the
    /// reference is `{image_dir}/{filename}`; without one the file sits in
    /// `out_dir` and the reference is the bare filename.
    #[must_use]
    pub fn resolve(key: &DiagramKey<'_>, out_dir: &Path, image_dir: Option<&str>) -> Self {
        let filename = key.filename();
        match image_dir {
            Some(dir) => Self {
                refname: format!("{dir}/{filename}"),
                path: out_dir.join(dir).join(&filename),
            },
            None => Self {
                path: out_dir.join(&filename),
                refname: filename,
            },
        }
    }
}
