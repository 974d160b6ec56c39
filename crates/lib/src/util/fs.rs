//! Recursive copy with permission preservation.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Copy `source` to `dest`, recursively for directories.
///
/// File permissions are preserved (`fs::copy` carries them over, and
/// directory permissions are re-applied explicitly). Symlinks inside a
/// directory tree are followed, so the copy contains regular files only.
///
/// Returns the number of files copied.
pub fn copy_recursive(source: &Path, dest: &Path) -> io::Result<u64> {
  let meta = fs::metadata(source)?;

  if meta.is_file() {
    fs::copy(source, dest)?;
    return Ok(1);
  }

  let mut copied = 0;
  for entry in WalkDir::new(source).follow_links(true) {
    let entry = entry.map_err(|e| e.into_io_error().unwrap_or_else(|| io::Error::other("walk failed")))?;
    let relative = entry
      .path()
      .strip_prefix(source)
      .map_err(|e| io::Error::other(e.to_string()))?;
    let target = dest.join(relative);

    if entry.file_type().is_dir() {
      fs::create_dir_all(&target)?;
      fs::set_permissions(&target, entry.metadata()?.permissions())?;
    } else {
      if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
      }
      fs::copy(entry.path(), &target)?;
      copied += 1;
    }
  }

  Ok(copied)
}
