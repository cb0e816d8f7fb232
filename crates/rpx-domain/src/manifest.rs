use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// The subset of `package.json` the resolver cares about.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PackageManifest {
    pub name: Option<String>,
    #[serde(default)]
    pub bin: Option<BinField>,
    pub main: Option<String>,
}

/// `bin` is either a single relative path or a name-to-path mapping.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum BinField {
    Single(String),
    Many(BTreeMap<String, String>),
}

impl PackageManifest {
    /// Parses the `package.json` text of a directory-style package.
    pub fn parse(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("invalid package manifest")
    }

    /// Declared entry point of the package rooted at `dir`: the executable
    /// mapping first, then the main module, then the conventional index file.
    #[must_use]
    pub fn entry_point(&self, dir: &Path) -> PathBuf {
        if let Some(bin) = &self.bin {
            match bin {
                BinField::Single(rel) => return dir.join(rel),
                BinField::Many(map) => {
                    if let Some(rel) = self.name.as_ref().and_then(|name| map.get(name)) {
                        return dir.join(rel);
                    }
                }
            }
        }
        if let Some(main) = &self.main {
            return dir.join(main);
        }
        dir.join("index.js")
    }
}
