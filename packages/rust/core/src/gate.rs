//! Manual gate: the Smalltalk file-out has to be produced by hand in Squeak.

use tracing::{debug, info};

use webscratch_shared::BuildLayout;

/// Whether the hand-made source dump is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    Ready,
    Missing,
}

/// Operator procedure for producing `ScratchSources.st`.
pub const MANUAL_INSTRUCTIONS: &str = r#"There is no way to script the Squeak file-out, so do it by hand once:

  1. Download Scratch 1.4 from <http://info.scratch.mit.edu/Scratch_1.4_Download>
     and install it. It is only needed for its Squeak VM.

  2. Open the extracted image. Squeak needs an absolute path to the image:
         cd build/sources/ScratchSource1.4
         /Applications/Scratch\ 1.4/Scratch.app/Contents/MacOS/Scratch "$PWD"/ScratchSourceCode1.4.image

  3. Open a Workspace: click on empty space, choose "open...", then "workspace".

  4. Paste this snippet into the workspace:
         |f|
         f _ FileStream newFileNamed: 'ScratchSources.st'.
         SystemOrganization categories do:
             [:c | SystemOrganization fileOutCategory: c on: f].
         f close.

  5. Select the code, control+click below the text and choose "do it (d)".
     Answer yes to overwriting the file, to "FileOut selected sharedPools"
     and to "FileOut sharedPool TextConstants".

  6. Close Squeak without saving changes.

  7. Fix the old Mac line endings (or build with --unix-newlines instead):
         perl -p -i -e 's/\r/\n/g' ScratchSources.st
"#;

/// Check for the hand-made source dump.
pub fn check_manual_source(layout: &BuildLayout) -> GateStatus {
    if layout.raw_source.is_file() {
        debug!(path = %layout.raw_source.display(), "manual source present");
        GateStatus::Ready
    } else {
        info!(path = %layout.raw_source.display(), "manual source missing, pausing build");
        GateStatus::Missing
    }
}

/// Short notice printed ahead of [`MANUAL_INSTRUCTIONS`].
pub fn missing_notice(layout: &BuildLayout) -> String {
    format!(
        "{} must be built manually.\nFollow the instructions below, then re-run the build.",
        layout.raw_source_display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_dir;

    #[test]
    fn missing_until_file_exists() {
        let root = temp_dir("gate");
        let layout = BuildLayout::new(&root);
        assert_eq!(check_manual_source(&layout), GateStatus::Missing);

        std::fs::create_dir_all(layout.raw_source.parent().unwrap()).unwrap();
        std::fs::write(&layout.raw_source, b"Object subclass: #Foo").unwrap();
        assert_eq!(check_manual_source(&layout), GateStatus::Ready);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn directory_at_source_path_does_not_count() {
        let root = temp_dir("gate");
        let layout = BuildLayout::new(&root);
        std::fs::create_dir_all(&layout.raw_source).unwrap();
        assert_eq!(check_manual_source(&layout), GateStatus::Missing);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn notice_names_relative_path() {
        let layout = BuildLayout::new("/somewhere");
        let notice = missing_notice(&layout);
        assert!(notice.starts_with("build/sources/ScratchSource1.4/ScratchSources.st"));
        assert!(MANUAL_INSTRUCTIONS.contains("fileOutCategory"));
    }
}
