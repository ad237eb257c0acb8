//! systemd unit file generation
//!
//! Builds INI-style descriptor files (`.link`, `.network`, `.mount`,
//! resolved drop-ins), implements the unit-name escaping from
//! systemd.unit(5), and tracks the set of units a run has touched.

use crate::RdInitError;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// A section of a unit file
#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

/// An INI-style systemd descriptor
///
/// Sections render in the order they were first declared (either through
/// [`UnitFile::with_sections`] or the first [`UnitFile::set`] that mentions
/// them). Sections without entries are not rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitFile {
    sections: Vec<Section>,
}

impl UnitFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-declare the section order
    pub fn with_sections(names: &[&str]) -> Self {
        Self {
            sections: names
                .iter()
                .map(|name| Section {
                    name: name.to_string(),
                    entries: Vec::new(),
                })
                .collect(),
        }
    }

    /// Set `key=value` in `section`, replacing an earlier value for the key
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        let index = match self.sections.iter().position(|s| s.name == section) {
            Some(index) => index,
            None => {
                self.sections.push(Section {
                    name: section.to_string(),
                    entries: Vec::new(),
                });
                self.sections.len() - 1
            }
        };

        let entries = &mut self.sections[index].entries;
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key.to_string(), value)),
        }
        self
    }

    /// Look up a value
    #[cfg(test)]
    pub(crate) fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.name == section)?
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// True when no section has any entry
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.entries.is_empty())
    }

    /// Names of the sections that will be rendered
    #[cfg(test)]
    pub(crate) fn section_names(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|s| !s.entries.is_empty())
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Render to file contents
    pub fn render(&self) -> String {
        let mut content = String::new();
        for (i, section) in self
            .sections
            .iter()
            .filter(|s| !s.entries.is_empty())
            .enumerate()
        {
            if i > 0 {
                content.push('\n');
            }
            let _ = writeln!(content, "[{}]", section.name);
            for (key, value) in &section.entries {
                let _ = writeln!(content, "{}={}", key, value);
            }
        }
        content
    }
}

/// A rendered configuration file ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Absolute destination path
    pub path: PathBuf,
    /// File contents
    pub content: String,
    /// File permissions (octal)
    pub mode: u32,
}

impl RenderedFile {
    pub fn new(path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            content: content.into(),
            mode: 0o644,
        }
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Write the file, creating parent directories as needed
    pub async fn write(&self) -> Result<(), RdInitError> {
        debug!("Writing {}", self.path.display());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                RdInitError::os(format!("failed to create {}", parent.display()), e)
            })?;
        }

        let write_error = |e: std::io::Error| {
            RdInitError::os(format!("failed to write {}", self.path.display()), e)
        };

        // New files never exist with a wider mode than requested.
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(self.mode)
            .open(&self.path)
            .await
            .map_err(write_error)?;
        file.write_all(self.content.as_bytes())
            .await
            .map_err(write_error)?;
        file.flush().await.map_err(write_error)?;

        // An existing file keeps its old mode until this point.
        set_mode(&self.path, self.mode).await
    }
}

/// Apply an exact permission mode to a path
pub async fn set_mode(path: &Path, mode: u32) -> Result<(), RdInitError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .await
        .map_err(|e| {
            RdInitError::os(
                format!("failed to set mode {:o} on {}", mode, path.display()),
                e,
            )
        })
}

/// Escape a path the way `systemd-escape --path` does
///
/// The path is normalized first (duplicate separators, `.` and `..`
/// components are collapsed), leading and trailing `/` are dropped and the
/// remaining separators become `-`. Bytes outside `[A-Za-z0-9:_.]` are
/// written as `\xNN`, as is a leading `.`. The root directory escapes to `-`.
pub fn escape_path(path: &str) -> String {
    let cleaned = clean_path(path);
    if cleaned.is_empty() {
        return "-".to_string();
    }

    let mut escaped = String::with_capacity(cleaned.len());
    for (i, byte) in cleaned.bytes().enumerate() {
        match byte {
            b'/' => escaped.push('-'),
            b'.' if i == 0 => escaped.push_str("\\x2e"),
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b':' | b'_' | b'.' => {
                escaped.push(byte as char)
            }
            _ => {
                let _ = write!(escaped, "\\x{:02x}", byte);
            }
        }
    }
    escaped
}

/// Lexically normalize a path and strip its outer separators
fn clean_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&"..") | None if !absolute => parts.push(".."),
                Some(_) => {
                    parts.pop();
                }
                None => {}
            },
            other => parts.push(other),
        }
    }

    parts.join("/")
}

/// Name of the mount unit for a mount point, e.g. `/mnt/data` -> `mnt-data.mount`
pub fn mount_unit_name(mount_point: &str) -> String {
    format!("{}.mount", escape_path(mount_point))
}

/// Ordered, duplicate-free collection of unit names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitSet {
    units: Vec<String>,
}

impl UnitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit; returns false if it was already present
    pub fn insert(&mut self, unit: impl Into<String>) -> bool {
        let unit = unit.into();
        if self.units.contains(&unit) {
            return false;
        }
        self.units.push(unit);
        true
    }

    /// Number of distinct units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(String::as_str)
    }
}

impl Extend<String> for UnitSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for unit in iter {
            self.insert(unit);
        }
    }
}

impl FromIterator<String> for UnitSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = UnitSet::new();
        set.extend(iter);
        set
    }
}
