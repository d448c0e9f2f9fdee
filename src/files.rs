//! Filesystem storage for attachment blobs.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

use rand::{thread_rng, Rng};

use crate::{Error, Result};

/// Where attachment blobs live.
///
/// Blobs are stored under generated save names, never under the name the
/// uploader gave, so concurrent stores can't collide and a hostile filename
/// can't escape the directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a file store rooted at `root`, creating the directory if it
    /// doesn't exist yet.
    pub fn open<P>(root: P) -> Result<FileStore>
    where
        P: AsRef<Path>,
    {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(&root).map_err(|err| {
            Error::from_io_error(err, format!("Couldn't create upload dir {}", root.display()))
        })?;

        Ok(FileStore { root })
    }

    /// The directory the store lives in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a blob and return the save name it was stored under.
    ///
    /// The save name keeps the original file's extension and nothing else of
    /// the user-supplied name.
    pub fn store(&self, data: &[u8], original_name: &str) -> Result<String> {
        let ext = sanitize_extension(original_name);
        let epoch = Utc::now().format("%s").to_string();

        // Loop until we generate a name that isn't already taken.
        let mut save_name: String;
        loop {
            let nonce: u32 = thread_rng().gen();

            save_name = match ext.as_deref() {
                Some(ext) => format!("{}-{:08x}.{}", epoch, nonce, ext),
                None => format!("{}-{:08x}", epoch, nonce),
            };

            if !self.path(&save_name).exists() {
                break;
            }
        }

        let save_path = self.path(&save_name);
        let mut save_file = File::create(&save_path).map_err(|err| {
            Error::from_io_error(
                err,
                format!("Couldn't create upload file {}", save_path.display()),
            )
        })?;

        save_file.write_all(data)?;

        Ok(save_name)
    }

    /// The on-disk path of a saved blob.
    pub fn path(&self, save_name: &str) -> PathBuf {
        self.root.join(save_name)
    }

    /// Whether a blob exists.
    pub fn exists(&self, save_name: &str) -> bool {
        self.path(save_name).exists()
    }

    /// Delete a blob. Deleting one that is already gone is a no-op.
    pub fn delete(&self, save_name: &str) -> Result<()> {
        let path = self.path(save_name);

        if path.exists() {
            fs::remove_file(&path).map_err(|err| {
                Error::from_io_error(err, format!("Couldn't delete upload {}", path.display()))
            })?;
        }

        Ok(())
    }
}

/// The extension of `name`, lowercased, if it looks safe to reuse.
fn sanitize_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;

    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> FileStore {
        let dir = std::env::temp_dir().join(format!("corkboard-test-{:08x}", thread_rng().gen::<u32>()));
        FileStore::open(dir).expect("couldn't open test file store")
    }

    #[test]
    fn stores_and_deletes_blobs() -> Result<()> {
        let store = test_store();

        let save_name = store.store(b"hello", "notes.txt")?;
        assert!(store.exists(&save_name));
        assert_eq!(fs::read(store.path(&save_name))?, b"hello");

        store.delete(&save_name)?;
        assert!(!store.exists(&save_name));

        // Deleting again is fine.
        store.delete(&save_name)?;

        Ok(())
    }

    #[test]
    fn save_names_never_reuse_the_original() -> Result<()> {
        let store = test_store();

        let first = store.store(b"a", "Report FINAL (2).PDF")?;
        let second = store.store(b"b", "Report FINAL (2).PDF")?;

        assert_ne!(first, second);
        assert_ne!(first, "Report FINAL (2).PDF");
        assert!(first.ends_with(".pdf"));

        Ok(())
    }

    #[test]
    fn odd_extensions_are_dropped() {
        assert_eq!(sanitize_extension("notes.txt"), Some("txt".into()));
        assert_eq!(sanitize_extension("archive.TAR"), Some("tar".into()));
        assert_eq!(sanitize_extension("noext"), None);
        assert_eq!(sanitize_extension("weird.t;t"), None);
    }
}
