use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration for a corkboard instance.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Where the SQLite database lives.
    pub database_path: PathBuf,
    /// Where the user-uploaded attachment files are.
    pub upload_dir: PathBuf,
    /// File to log to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// How many threads fit on one listing page.
    pub page_width: u32,
}

impl Config {
    /// Open a config file at the given path.
    pub fn open<P>(path: P) -> Result<Config>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let msg = format!("Couldn't open config file at {}", path.display());

        let reader = File::open(path).map_err(|err| Error::from_io_error(err, msg))?;

        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Generate a new config file from default values.
    pub fn generate<W>(mut out: W) -> Result<()>
    where
        W: std::io::Write,
    {
        writeln!(&mut out, "# Configuration for corkboard")?;
        serde_yaml::to_writer(&mut out, &Config::default())?;
        writeln!(&mut out)?;
        Ok(())
    }

    /// Get the default location of the config file.
    pub fn default_path() -> PathBuf {
        if cfg!(debug_assertions) {
            PathBuf::from("contrib/dev-config.yaml")
        } else {
            PathBuf::from("/etc/corkboard/config.yaml")
        }
    }

    /// Dump configuration info to the log.
    pub fn debug_log(&self) {
        use log::debug;

        debug!("  database path {}", self.database_path.display());
        debug!("  upload dir {}", self.upload_dir.display());
        debug!("  page width {}", self.page_width);
        if let Some(ref log_file) = self.log_file {
            debug!("  log file {}", log_file.display());
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        if cfg!(debug_assertions) {
            Config {
                database_path: PathBuf::from("corkboard.db"),
                upload_dir: PathBuf::from("uploads"),
                log_file: None,
                page_width: 10,
            }
        } else {
            Config {
                database_path: PathBuf::from("/var/lib/corkboard/corkboard.db"),
                upload_dir: PathBuf::from("/var/lib/corkboard/uploads"),
                log_file: Some(PathBuf::from("/var/log/corkboard/corkboard.log")),
                page_width: 10,
            }
        }
    }
}
