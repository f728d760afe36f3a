//! Vendor archive extraction: `original-sources/*.zip` → `build/sources/`.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use webscratch_shared::{BuildLayout, Result, WebscratchError};

use crate::pipeline::ProgressReporter;

/// Outcome of unpacking every configured archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Archives unpacked, in order.
    pub archives: Vec<String>,
    /// Regular files written across all archives.
    pub files_written: usize,
    /// Whether `build/sources` had to be created.
    pub created_dir: bool,
}

/// Unpack each named archive into `layout.sources_dir`, in order.
///
/// Creates the destination (and parents) when absent. Existing files are
/// overwritten, so re-running is safe. A missing or corrupt archive stops
/// the whole run.
#[instrument(skip_all, fields(dest = %layout.sources_dir.display()))]
pub async fn extract_archives(
    layout: &BuildLayout,
    names: &[String],
    progress: &dyn ProgressReporter,
) -> Result<ExtractSummary> {
    let dest = layout.sources_dir.clone();
    let created_dir = !tokio::fs::metadata(&dest)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if created_dir {
        info!(path = %dest.display(), "mkdir");
        tokio::fs::create_dir_all(&dest)
            .await
            .map_err(|e| WebscratchError::io(&dest, e))?;
    }

    let mut files_written = 0;
    for (i, name) in names.iter().enumerate() {
        progress.archive_started(name, i + 1, names.len());
        info!(archive = %name, "unzip");

        let archive = layout.archive_path(name);
        let target = dest.clone();
        let written = tokio::task::spawn_blocking(move || extract_archive(&archive, &target))
            .await
            .map_err(|e| {
                WebscratchError::archive(
                    layout.archive_path(name),
                    format!("extraction task failed: {e}"),
                )
            })??;

        debug!(archive = %name, files = written, "archive extracted");
        files_written += written;
    }

    Ok(ExtractSummary {
        archives: names.to_vec(),
        files_written,
        created_dir,
    })
}

/// Extract every entry of one zip file into `dest`. Returns the number of files written.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(archive_path).map_err(|e| WebscratchError::io(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| WebscratchError::archive(archive_path, e.to_string()))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| WebscratchError::archive(archive_path, e.to_string()))?;

        let relative = entry.enclosed_name().ok_or_else(|| {
            WebscratchError::archive(
                archive_path,
                format!("entry escapes destination: {}", entry.name()),
            )
        })?;
        let out_path: PathBuf = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| WebscratchError::io(&out_path, e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| WebscratchError::io(parent, e))?;
        }

        // File::create truncates, so a second extraction overwrites in place.
        let mut out = File::create(&out_path).map_err(|e| WebscratchError::io(&out_path, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| WebscratchError::io(&out_path, e))?;
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SilentProgress;
    use crate::test_support::{temp_dir, write_zip};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn creates_missing_destination_with_parents() {
        let root = temp_dir("archive");
        let layout = BuildLayout::new(&root);
        write_zip(
            &layout.archive_path("a.zip"),
            &[("ScratchSource1.4/readme.txt", b"hello".as_slice())],
        );

        assert!(!layout.build_dir.exists());
        let summary = extract_archives(&layout, &names(&["a.zip"]), &SilentProgress)
            .await
            .expect("extract");

        assert!(summary.created_dir);
        assert_eq!(summary.files_written, 1);
        let content =
            std::fs::read(layout.sources_dir.join("ScratchSource1.4/readme.txt")).unwrap();
        assert_eq!(content, b"hello");
        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn rerun_overwrites_and_does_not_fail() {
        let root = temp_dir("archive");
        let layout = BuildLayout::new(&root);
        write_zip(
            &layout.archive_path("a.zip"),
            &[("skin/button.gif", b"GIF89a".as_slice())],
        );
        let list = names(&["a.zip"]);

        extract_archives(&layout, &list, &SilentProgress)
            .await
            .expect("first extract");
        let extracted = layout.sources_dir.join("skin/button.gif");
        std::fs::write(&extracted, b"locally modified and longer").unwrap();

        let summary = extract_archives(&layout, &list, &SilentProgress)
            .await
            .expect("second extract");
        assert!(!summary.created_dir);
        assert_eq!(std::fs::read(&extracted).unwrap(), b"GIF89a");
        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn archives_extract_in_order_later_wins() {
        let root = temp_dir("archive");
        let layout = BuildLayout::new(&root);
        write_zip(
            &layout.archive_path("first.zip"),
            &[("shared.txt", b"first".as_slice()), ("one.txt", b"1".as_slice())],
        );
        write_zip(
            &layout.archive_path("second.zip"),
            &[("shared.txt", b"second".as_slice())],
        );

        let summary = extract_archives(
            &layout,
            &names(&["first.zip", "second.zip"]),
            &SilentProgress,
        )
        .await
        .expect("extract");

        assert_eq!(summary.files_written, 3);
        assert_eq!(summary.archives, names(&["first.zip", "second.zip"]));
        assert_eq!(
            std::fs::read(layout.sources_dir.join("shared.txt")).unwrap(),
            b"second"
        );
        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn missing_archive_is_io_error() {
        let root = temp_dir("archive");
        let layout = BuildLayout::new(&root);

        let err = extract_archives(&layout, &names(&["absent.zip"]), &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, WebscratchError::Io { .. }));
        assert!(err.to_string().contains("absent.zip"));
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn corrupt_archive_is_archive_error() {
        let root = temp_dir("archive");
        let bogus = root.join("bogus.zip");
        std::fs::write(&bogus, b"this is not a zip file").unwrap();

        let err = extract_archive(&bogus, &root.join("out")).unwrap_err();
        assert!(matches!(err, WebscratchError::Archive { .. }));
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn directory_entries_are_created() {
        let root = temp_dir("archive");
        let zip_path = root.join("dirs.zip");
        write_zip(
            &zip_path,
            &[("empty/", b"".as_slice()), ("nested/deep/file.st", b"x".as_slice())],
        );

        let dest = root.join("out");
        let written = extract_archive(&zip_path, &dest).expect("extract");
        assert_eq!(written, 1);
        assert!(dest.join("empty").is_dir());
        assert!(dest.join("nested/deep/file.st").is_file());
        std::fs::remove_dir_all(&root).ok();
    }
}
