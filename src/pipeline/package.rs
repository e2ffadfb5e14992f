//! Packaging: write a [`SiteBundle`] to disk and build the download archive.
//!
//! A successful request leaves four files in the output directory:
//! `index.html`, `style.css`, `script.js` and `website.zip`, the archive
//! holding exactly the three site files at its root. A later request
//! overwrites all four.
//!
//! Each file is written to a temporary file in the same directory and then
//! renamed into place, so a reader never sees a half-written file. The four
//! renames are not atomic as a group.

use crate::error::Resume2WebError;
use crate::output::SiteBundle;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

pub const HTML_FILE: &str = "index.html";
pub const CSS_FILE: &str = "style.css";
pub const JS_FILE: &str = "script.js";
pub const ARCHIVE_FILE: &str = "website.zip";

/// Paths of the files written for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSite {
    pub html: PathBuf,
    pub css: PathBuf,
    pub js: PathBuf,
    pub archive: PathBuf,
}

impl PersistedSite {
    fn in_dir(dir: &Path) -> Self {
        Self {
            html: dir.join(HTML_FILE),
            css: dir.join(CSS_FILE),
            js: dir.join(JS_FILE),
            archive: dir.join(ARCHIVE_FILE),
        }
    }

    /// All four paths, site files first.
    pub fn paths(&self) -> [&Path; 4] {
        [&self.html, &self.css, &self.js, &self.archive]
    }
}

/// Build the zip archive of a bundle in memory.
///
/// Exactly three entries: `index.html`, `style.css`, `script.js`.
pub fn archive_bytes(bundle: &SiteBundle) -> Result<Vec<u8>, Resume2WebError> {
    let failed = |detail: String| Resume2WebError::ArchiveFailed {
        path: PathBuf::from(ARCHIVE_FILE),
        detail,
    };

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));

    for (name, content) in site_files(bundle) {
        zip.start_file(name, options)
            .map_err(|e| failed(format!("{name}: {e}")))?;
        zip.write_all(content.as_bytes())
            .map_err(|e| failed(format!("{name}: {e}")))?;
    }

    let bytes = zip
        .finish()
        .map_err(|e| failed(e.to_string()))?
        .into_inner();
    debug!("Archive built: {} bytes", bytes.len());
    Ok(bytes)
}

fn site_files(bundle: &SiteBundle) -> [(&'static str, &str); 3] {
    [
        (HTML_FILE, bundle.html()),
        (CSS_FILE, bundle.css()),
        (JS_FILE, bundle.js()),
    ]
}

/// Write the three site files and the archive into `dir`.
///
/// Creates `dir` if needed. Runs the file I/O on the blocking pool.
pub async fn persist_bundle(
    bundle: &SiteBundle,
    dir: &Path,
) -> Result<PersistedSite, Resume2WebError> {
    let archive = archive_bytes(bundle)?;
    let bundle = bundle.clone();
    let dir = dir.to_path_buf();

    let site = tokio::task::spawn_blocking(move || persist_blocking(&bundle, &archive, &dir))
        .await
        .map_err(|e| Resume2WebError::Internal(format!("Persist task panicked: {}", e)))??;

    info!(
        "Wrote {}, {}, {}, {}",
        site.html.display(),
        site.css.display(),
        site.js.display(),
        site.archive.display()
    );
    Ok(site)
}

fn persist_blocking(
    bundle: &SiteBundle,
    archive: &[u8],
    dir: &Path,
) -> Result<PersistedSite, Resume2WebError> {
    std::fs::create_dir_all(dir).map_err(|e| Resume2WebError::OutputWriteFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let site = PersistedSite::in_dir(dir);
    for (name, content) in site_files(bundle) {
        write_replace(dir, &dir.join(name), content.as_bytes())?;
    }
    write_replace(dir, &site.archive, archive)?;
    Ok(site)
}

/// Write `bytes` to a temp file in `dir` and rename it over `target`.
fn write_replace(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), Resume2WebError> {
    let write_err = |source: std::io::Error| Resume2WebError::OutputWriteFailed {
        path: target.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(target).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn bundle(tag: &str) -> SiteBundle {
        SiteBundle::new(
            format!("<h1>{tag}</h1>"),
            format!("h1 {{ content: '{tag}'; }}"),
            format!("console.log('{tag}');"),
        )
        .unwrap()
    }

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn archive_has_exactly_three_entries() {
        let bytes = archive_bytes(&bundle("a")).unwrap();
        assert_eq!(entry_names(&bytes), vec!["index.html", "script.js", "style.css"]);
    }

    #[test]
    fn archive_entries_match_bundle() {
        let b = bundle("x");
        let bytes = archive_bytes(&b).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut css = String::new();
        archive
            .by_name(CSS_FILE)
            .unwrap()
            .read_to_string(&mut css)
            .unwrap();
        assert_eq!(css, b.css());
    }

    #[tokio::test]
    async fn persist_writes_four_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("site");
        let site = persist_bundle(&bundle("a"), &out).await.unwrap();

        for path in site.paths() {
            assert!(path.exists(), "{} missing", path.display());
        }
        assert_eq!(std::fs::read_to_string(&site.html).unwrap(), "<h1>a</h1>");
        assert_eq!(
            entry_names(&std::fs::read(&site.archive).unwrap()).len(),
            3
        );
    }

    #[tokio::test]
    async fn second_request_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        persist_bundle(&bundle("first"), dir.path()).await.unwrap();
        let site = persist_bundle(&bundle("second"), dir.path()).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&site.js).unwrap(),
            "console.log('second');"
        );
        // Only the four artefacts remain; no temp files left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 4);
    }
}
