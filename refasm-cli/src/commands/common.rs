use std::path::{Path, PathBuf};

use anyhow::Context;
use refasm::codec::IMAGE_EXTENSION;

/// Suffix appended to the stem of every generated file or directory.
pub const REFERENCE_SUFFIX: &str = "-reference";

/// Collect all module image files recursively from a directory.
///
/// PE files (`.dll`, `.exe`, `.winmd`) are left alone; the codec reads module images only.
pub fn collect_images(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_images_recursive(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_images_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_images_recursive(&path, files)?;
        } else if is_image_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Returns true if the path has the module image extension, in any case.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(IMAGE_EXTENSION))
}

/// Default output for an input: `dir/name.ext` becomes `dir/name-reference.ext`
/// and a directory `dir` becomes `dir-reference`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or(Path::new("."));
    if input.is_dir() {
        let name = input
            .file_name()
            .map_or_else(|| "output".to_string(), |n| n.to_string_lossy().to_string());
        return parent.join(format!("{name}{REFERENCE_SUFFIX}"));
    }
    parent.join(suffixed_filename(input, REFERENCE_SUFFIX))
}

fn suffixed_filename(input: &Path, suffix: &str) -> String {
    let stem = input
        .file_stem()
        .map_or_else(|| "output".to_string(), |s| s.to_string_lossy().to_string());
    let ext = input
        .extension()
        .map_or_else(String::new, |e| e.to_string_lossy().to_string());

    if ext.is_empty() {
        format!("{stem}{suffix}")
    } else {
        format!("{stem}{suffix}.{ext}")
    }
}

/// Extract a display-friendly filename from a path.
pub fn file_display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_for_file() {
        assert_eq!(
            default_output_path(Path::new("bin/Lib.refimg")),
            PathBuf::from("bin/Lib-reference.refimg")
        );
        assert_eq!(
            default_output_path(Path::new("bin/Windows.Foundation.refimg")),
            PathBuf::from("bin/Windows.Foundation-reference.refimg")
        );
        assert_eq!(default_output_path(Path::new("bin/tool")), PathBuf::from("bin/tool-reference"));
    }

    #[test]
    fn test_default_output_for_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bin");
        std::fs::create_dir(&input).unwrap();
        assert_eq!(default_output_path(&input), dir.path().join("bin-reference"));
    }

    #[test]
    fn test_collect_images_skips_pe_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        for name in [
            "a.refimg",
            "sub/b.REFIMG",
            "sub/deeper/c.refimg",
            "sub/deeper/c.dll",
            "app.exe",
            "Windows.winmd",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let found: Vec<_> = collect_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            found,
            vec![
                PathBuf::from("a.refimg"),
                PathBuf::from("sub/b.REFIMG"),
                PathBuf::from("sub/deeper/c.refimg"),
            ]
        );
    }
}
