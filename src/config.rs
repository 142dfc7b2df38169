use serde::Serialize;

use crate::{
    document_db::DocumentDb,
    error::{Error, Result},
    snippet::SnippetWindow,
};

pub const STRUCTURED_BEFORE: &str = "structured_before";
pub const STRUCTURED_AFTER: &str = "structured_after";
pub const RAW_BEFORE: &str = "raw_before";
pub const RAW_AFTER: &str = "raw_after";

pub const KEYS: [&str; 4] =
    [STRUCTURED_BEFORE, STRUCTURED_AFTER, RAW_BEFORE, RAW_AFTER];

/// Snippet windows used by a search.
///
/// `structured` applies to titles, page text, translations and
/// annotations; `raw` applies to documents stored as flat page text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchConfig {
    pub structured: SnippetWindow,
    pub raw: SnippetWindow,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            structured: SnippetWindow::STRUCTURED,
            raw: SnippetWindow::RAW,
        }
    }
}

impl SearchConfig {
    /// Read the stored windows, falling back to the defaults.
    pub fn load(db: &DocumentDb) -> Result<Self> {
        let mut config = Self::default();
        for key in KEYS {
            if let Some(value) = db.get_setting(key)? {
                config.set(key, parse_setting(key, &value)?)?;
            }
        }
        Ok(config)
    }

    pub fn store(&self, db: &DocumentDb) -> Result<()> {
        for (key, value) in self.entries() {
            db.set_setting(key, &value.to_string())?;
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<usize> {
        match key {
            STRUCTURED_BEFORE => Ok(self.structured.before),
            STRUCTURED_AFTER => Ok(self.structured.after),
            RAW_BEFORE => Ok(self.raw.before),
            RAW_AFTER => Ok(self.raw.after),
            other => Err(unknown_key(other)),
        }
    }

    pub fn set(&mut self, key: &str, value: usize) -> Result<()> {
        let slot = match key {
            STRUCTURED_BEFORE => &mut self.structured.before,
            STRUCTURED_AFTER => &mut self.structured.after,
            RAW_BEFORE => &mut self.raw.before,
            RAW_AFTER => &mut self.raw.after,
            other => return Err(unknown_key(other)),
        };
        *slot = value;
        Ok(())
    }

    pub fn entries(&self) -> [(&'static str, usize); 4] {
        [
            (STRUCTURED_BEFORE, self.structured.before),
            (STRUCTURED_AFTER, self.structured.after),
            (RAW_BEFORE, self.raw.before),
            (RAW_AFTER, self.raw.after),
        ]
    }
}

fn parse_setting(key: &str, value: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| {
        Error::Config(format!(
            "setting '{key}' must be a non-negative integer, got '{value}'"
        ))
    })
}

fn unknown_key(key: &str) -> Error {
    Error::Config(format!(
        "unknown setting '{key}' (expected one of: {})",
        KEYS.join(", ")
    ))
}
