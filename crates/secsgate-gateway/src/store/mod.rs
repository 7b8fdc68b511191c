//! Filesystem-backed template store: `<root>/<name>.json`.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;

use secsgate_core::error::{Result, SecsGateError};
use secsgate_core::template::{Template, TemplateStore};

pub struct FsTemplateStore {
    root: PathBuf,
}

impl FsTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let stem = name.strip_suffix(".json").unwrap_or(name);
        if !is_valid_stem(stem) {
            return Err(SecsGateError::BadRequest(format!("invalid template name: {name:?}")));
        }
        Ok(self.root.join(format!("{stem}.json")))
    }
}

/// Names `load` accepts. Listing applies the same rule.
fn is_valid_stem(stem: &str) -> bool {
    !stem.is_empty()
        && !stem.starts_with('.')
        && !stem.contains(&['/', '\\', '\0'][..])
        && !stem.contains("..")
}

impl TemplateStore for FsTemplateStore {
    fn list_names(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(root = %self.root.display(), "templates dir missing");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(SecsGateError::Internal(format!(
                    "read templates dir failed ({}): {e}",
                    self.root.display()
                )))
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_owned))
            .filter(|stem| is_valid_stem(stem))
            .collect();
        names.sort();
        Ok(names)
    }

    fn load(&self, name: &str) -> Result<Template> {
        let path = self.path_for(name)?;
        let s = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SecsGateError::NotFound(format!("template {name}")));
            }
            Err(e) => {
                return Err(SecsGateError::Internal(format!(
                    "read template failed ({}): {e}",
                    path.display()
                )))
            }
        };
        Template::from_json_str(&s)
    }
}
