//! Build layout: every path the pipeline touches, derived from one root.

use std::path::{Path, PathBuf};

/// Vendor archives shipped in `original-sources/`, in extraction order.
pub const DEFAULT_ARCHIVES: [&str; 3] = [
    "ScratchPluginSrc1.4.zip",
    "ScratchSource1.4.zip",
    "ScratchSkin1.4.zip",
];

/// Directory inside the sources tree that holds the Smalltalk image.
const SOURCE_TREE_DIR: &str = "ScratchSource1.4";

/// File-out produced by hand from the Squeak image.
const RAW_SOURCE_NAME: &str = "ScratchSources.st";

/// Resolved paths for one project checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    /// Project root (holds `original-sources/`, `js/`, `build/`).
    pub root: PathBuf,
    /// `original-sources/`: the vendor zip files.
    pub original_sources_dir: PathBuf,
    /// `build/`
    pub build_dir: PathBuf,
    /// `build/sources/`: extraction target.
    pub sources_dir: PathBuf,
    /// Hand-made 8-bit Smalltalk dump.
    pub raw_source: PathBuf,
    /// UTF-8 rendition of `raw_source`, written next to it.
    pub recoded_source: PathBuf,
    /// Whatever the compiler prints, captured verbatim.
    pub compiled_output: PathBuf,
    /// `js/`: compiler working directory.
    pub js_dir: PathBuf,
    /// `js/tests/`: self-test working directory.
    pub tests_dir: PathBuf,
}

impl BuildLayout {
    /// Derive the layout from a project root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let build_dir = root.join("build");
        let sources_dir = build_dir.join("sources");
        let source_tree = sources_dir.join(SOURCE_TREE_DIR);
        let js_dir = root.join("js");

        Self {
            original_sources_dir: root.join("original-sources"),
            raw_source: source_tree.join(RAW_SOURCE_NAME),
            recoded_source: source_tree.join(format!("{RAW_SOURCE_NAME}.utf8")),
            compiled_output: build_dir.join("ScratchSources.js"),
            tests_dir: js_dir.join("tests"),
            js_dir,
            sources_dir,
            build_dir,
            root,
        }
    }

    /// Path of a named archive under `original-sources/`.
    pub fn archive_path(&self, name: &str) -> PathBuf {
        self.original_sources_dir.join(name)
    }

    /// `raw_source` relative to the root, for operator-facing messages.
    pub fn raw_source_display(&self) -> String {
        relative_display(&self.root, &self.raw_source)
    }
}

fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_root() {
        let layout = BuildLayout::new("/work/webscratch");
        assert_eq!(
            layout.sources_dir,
            PathBuf::from("/work/webscratch/build/sources")
        );
        assert_eq!(
            layout.raw_source,
            PathBuf::from("/work/webscratch/build/sources/ScratchSource1.4/ScratchSources.st")
        );
        assert_eq!(
            layout.recoded_source,
            PathBuf::from("/work/webscratch/build/sources/ScratchSource1.4/ScratchSources.st.utf8")
        );
        assert_eq!(
            layout.compiled_output,
            PathBuf::from("/work/webscratch/build/ScratchSources.js")
        );
        assert_eq!(layout.tests_dir, PathBuf::from("/work/webscratch/js/tests"));
    }

    #[test]
    fn archive_path_uses_original_sources() {
        let layout = BuildLayout::new("/p");
        assert_eq!(
            layout.archive_path(DEFAULT_ARCHIVES[1]),
            PathBuf::from("/p/original-sources/ScratchSource1.4.zip")
        );
    }

    #[test]
    fn raw_source_display_is_relative() {
        let layout = BuildLayout::new("/p");
        assert_eq!(
            layout.raw_source_display(),
            "build/sources/ScratchSource1.4/ScratchSources.st"
        );
    }
}
