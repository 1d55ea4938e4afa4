//! Named output payloads accumulated over one generation

use crate::error::Result;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Bytes(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Bytes(_) => None,
        }
    }
}

/// Ordered set of `path -> payload` entries
///
/// Paths are relative and `/`-separated. Inserting an existing path replaces
/// its payload in place.
#[derive(Debug, Default, Clone)]
pub struct Bundle {
    entries: Vec<(String, Payload)>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, payload: Payload) {
        let path = path.into();
        match self.entries.iter_mut().find(|(p, _)| *p == path) {
            Some(slot) => {
                warn!("Overwriting bundle entry {}", path);
                slot.1 = payload;
            }
            None => self.entries.push((path, payload)),
        }
    }

    pub fn insert_text(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.insert(path, Payload::Text(text.into()));
    }

    pub fn insert_bytes(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.insert(path, Payload::Bytes(bytes));
    }

    pub fn get(&self, path: &str) -> Option<&Payload> {
        self.entries.iter().find(|(p, _)| p == path).map(|(_, v)| v)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write every entry below `root`, creating directories as needed
    pub fn write_to_dir(&self, root: &Path) -> Result<()> {
        for (path, payload) in &self.entries {
            let target = root.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, payload.as_bytes())?;
        }
        info!("Wrote {} file(s) to {}", self.entries.len(), root.display());
        Ok(())
    }
}
