//! Miscellaneous utilities for bindzone.

use std::{
    fs,
    io::{self, Write},
};

use camino::Utf8Path;

/// Atomically write a file.
///
/// The contents are written to a temporary file in the same directory, which
/// then replaces `path`.  Readers see either the old or the new contents.
/// The permissions of the replaced file are kept; a new file is readable
/// by everyone (mode `0644` on Unix).
///
/// # Panics
///
/// Panics if 'path' does not have a containing directory.
pub fn write_file(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    // Ensure such a path _can_ exist.
    let dir = path
        .parent()
        .expect("'path' must be a file, so it must have a parent");
    fs::create_dir_all(dir)?;

    // Obtain a temporary file in the same directory.
    let mut tmp_file = tempfile::Builder::new()
        .prefix(".bindzone-")
        .tempfile_in(dir)?;

    // Fill up the temporary file.
    tmp_file.as_file_mut().write_all(contents)?;
    tmp_file.as_file().sync_all()?;

    // Temporary files are only accessible by their owner.
    let permissions = match fs::metadata(path) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => new_file_permissions(),
        Err(error) => return Err(error),
    };
    if let Some(permissions) = permissions {
        tmp_file.as_file().set_permissions(permissions)?;
    }

    // Replace the target path with the temporary file.
    let _ = tmp_file.persist(path)?;

    Ok(())
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

//============ Tests ===========================================================

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::write_file;

    #[test]
    fn replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let path = dir.join("nested").join("db.example.com");

        write_file(&path, b"first").unwrap();
        write_file(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");

        // No temporary files are left behind.
        let entries = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[cfg(unix)]
    #[test]
    fn keeps_permissions() {
        use std::{fs, os::unix::fs::PermissionsExt};

        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let path = dir.join("db.example.com");
        let mode = |path: &Utf8PathBuf| fs::metadata(path).unwrap().permissions().mode() & 0o777;

        write_file(&path, b"first").unwrap();
        assert_eq!(mode(&path), 0o644);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        write_file(&path, b"second").unwrap();
        assert_eq!(mode(&path), 0o640);
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }
}
