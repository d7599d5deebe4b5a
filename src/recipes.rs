//! Bundled recipe catalog: known application data paths and OS tweaks,
//! compiled into the binary. Applying an app recipe only writes link specs
//! into the store; nothing is installed until the user says so.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::link_ops::LinkSpec;

const CATALOG_JSON: &str = include_str!("recipes.json");

#[derive(Debug, Deserialize)]
pub struct RecipeCatalog {
    pub os_recipes: Vec<OsRecipe>,
    pub apps: Vec<AppRecipe>,
}

/// A one-shot `defaults`-style tweak, run through the post-action path.
#[derive(Debug, Deserialize)]
pub struct OsRecipe {
    pub name: String,
    pub description: String,
    pub defaults: String,
}

/// The files and directories a known application keeps its data in.
#[derive(Debug, Deserialize)]
pub struct AppRecipe {
    pub name: String,
    pub files: Vec<RecipeFile>,
}

#[derive(Debug, Deserialize)]
pub struct RecipeFile {
    pub path: String,
}

pub fn load_catalog() -> Result<RecipeCatalog> {
    serde_json::from_str(CATALOG_JSON).context("bundled recipe catalog is malformed")
}

impl RecipeCatalog {
    pub fn app(&self, name: &str) -> Option<&AppRecipe> {
        self.apps.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn os_recipe(&self, name: &str) -> Option<&OsRecipe> {
        self.os_recipes
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }
}

impl AppRecipe {
    /// Expand this recipe into link specs. Single-file recipes take the app
    /// name; multi-file recipes qualify each entry with the file stem. Slot
    /// paths live under a per-app directory so entries never collide.
    pub fn specs(&self) -> Vec<LinkSpec> {
        let slot_base = self.name.replace('/', "-");
        self.files
            .iter()
            .map(|file| {
                let leaf = Path::new(&file.path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.path.clone());
                let name = if self.files.len() == 1 {
                    self.name.clone()
                } else {
                    let stem = Path::new(&leaf)
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_else(|| leaf.clone());
                    format!("{} - {}", self.name, stem)
                };
                LinkSpec::new(name, file.path.clone(), format!("{slot_base}/{leaf}"))
            })
            .collect()
    }
}
