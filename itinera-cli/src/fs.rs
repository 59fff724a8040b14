//! Filesystem helpers built on `cap-std` and `camino`.

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};
use std::io;

/// Open a UTF-8 file path using ambient authority.
pub(crate) fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Open the directory containing `path` and return it with the file name.
///
/// A bare file name resolves against the current directory.
pub(crate) fn open_parent_and_name(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("target should include a file name"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Return whether a path exists and is a regular file using capability-based IO.
pub(crate) fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_parent_and_name(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_file())
}

/// Create or truncate `path` and write `contents` to it.
///
/// The parent directory must already exist.
pub(crate) fn write_utf8_file(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    let (dir, name) = open_parent_and_name(path)?;
    dir.write(name.as_str(), contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use std::io::Read;
    use tempfile::TempDir;

    #[fixture]
    fn workspace() -> (TempDir, Utf8PathBuf) {
        let tmp = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
        (tmp, root)
    }

    #[rstest]
    fn written_files_can_be_read_back(workspace: (TempDir, Utf8PathBuf)) {
        let (_tmp, root) = workspace;
        let path = root.join("out.json");

        write_utf8_file(&path, b"{\"days\":[]}").expect("write");
        let mut contents = String::new();
        open_utf8_file(&path)
            .expect("open")
            .read_to_string(&mut contents)
            .expect("read");

        assert_eq!(contents, "{\"days\":[]}");
        assert!(file_is_file(&path).expect("metadata"));
    }

    #[rstest]
    fn directories_are_not_files(workspace: (TempDir, Utf8PathBuf)) {
        let (_tmp, root) = workspace;
        let dir = root.join("nested");
        std::fs::create_dir(&dir).expect("mkdir");

        assert!(!file_is_file(&dir).expect("metadata"));
    }

    #[rstest]
    fn missing_files_report_not_found(workspace: (TempDir, Utf8PathBuf)) {
        let (_tmp, root) = workspace;

        let err = file_is_file(&root.join("absent.json")).expect_err("missing");

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[rstest]
    fn paths_without_a_file_name_are_rejected() {
        let err = open_parent_and_name(Utf8Path::new("/")).expect_err("no file name");

        assert_eq!(err.kind(), io::ErrorKind::Other);
    }
}
