//! Env file loading and base URL registration.
//!
//! When no `API_BASE_URL` is configured, the server derives one from the host
//! name and listening port and appends it to the env file, so later starts
//! pick it up through `load_env_file` on the same path. Registration runs once at
//! startup; repeated calls return the cached value without touching the file.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;

pub const BASE_URL_VAR: &str = "API_BASE_URL";

/// Load `path` into the process environment without overriding variables
/// already set. Returns false when the file does not exist.
pub fn load_env_file(path: &Path) -> anyhow::Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(dotenvy::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("loading {}", path.display())),
    }
}

pub struct BaseUrlRegistry {
    configured: Option<String>,
    port: u16,
    env_file: PathBuf,
    resolved: Mutex<Option<String>>,
}

impl BaseUrlRegistry {
    pub fn new(configured: Option<String>, port: u16, env_file: impl Into<PathBuf>) -> Self {
        Self {
            configured: configured.filter(|url| !url.trim().is_empty()),
            port,
            env_file: env_file.into(),
            resolved: Mutex::new(None),
        }
    }

    /// The base URL, deriving and persisting it on first use if none was configured.
    pub fn ensure_registered(&self) -> anyhow::Result<String> {
        let mut resolved = self
            .resolved
            .lock()
            .map_err(|_| anyhow::anyhow!("base url lock poisoned"))?;

        if let Some(url) = resolved.as_ref() {
            return Ok(url.clone());
        }

        let url = match &self.configured {
            Some(url) => url.clone(),
            None => {
                let url = derive_base_url(&hostname(), self.port);
                self.persist(&url)?;
                tracing::info!("Registered base URL {} in {}", url, self.env_file.display());
                url
            }
        };

        *resolved = Some(url.clone());
        Ok(url)
    }

    fn persist(&self, url: &str) -> anyhow::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.env_file)
            .with_context(|| format!("opening {}", self.env_file.display()))?;
        writeln!(file, "{}={}", BASE_URL_VAR, url)
            .with_context(|| format!("writing {}", self.env_file.display()))?;
        Ok(())
    }
}

pub fn derive_base_url(host: &str, port: u16) -> String {
    format!("http://{}:{}", host, port)
}

#[cfg(unix)]
fn hostname() -> String {
    let mut buf = [0u8; 256];
    // gethostname writes a NUL-terminated name into buf on success
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if rc != 0 {
        return "localhost".to_string();
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..len]).into_owned()
}

#[cfg(windows)]
fn hostname() -> String {
    std::env::var("COMPUTERNAME").unwrap_or_else(|_| "localhost".to_string())
}
