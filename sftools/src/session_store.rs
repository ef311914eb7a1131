use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use dirs::home_dir;
use log::*;
use storefront_engine::traits::{SessionError, SessionStore};

const STORE_DIR: &str = ".storefront";

/// A [`SessionStore`] that keeps one file per key in a private directory, `~/.storefront` by default.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn in_home_dir() -> io::Result<Self> {
        let home = home_dir().ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Home directory not found"))?;
        Ok(Self::new(home.join(STORE_DIR)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect::<String>();
        self.dir.join(format!("{name}.json"))
    }

    fn ensure_dir(&self) -> io::Result<()> {
        if !self.dir.exists() {
            info!("Creating session directory {}", self.dir.display());
            fs::create_dir_all(&self.dir)?;
            set_permissions(&self.dir, 0o700)?;
        }
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn read(&self, key: &str) -> Result<Option<String>, SessionError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.ensure_dir()?;
        let path = self.path_for(key);
        fs::write(&path, value)?;
        set_permissions(&path, 0o600)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn set_permissions(path: &Path, perms: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_mode(perms);
        fs::set_permissions(path, permissions)?;
    }
    #[cfg(not(unix))]
    let _ = (path, perms);
    Ok(())
}
