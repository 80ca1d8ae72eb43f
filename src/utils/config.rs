// Configuration loading: recipe and catalog (TOML), module config (YAML)

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::catalog::Catalog;
use crate::models::module_config::ModuleConfig;
use crate::models::recipe::Recipe;
use crate::utils::error::{Result, RkjmError};

/// Configuration parsing and validation utilities
pub struct ConfigParser;

impl ConfigParser {
    /// Load and validate a recipe from a TOML file
    pub fn load_recipe<P: AsRef<Path>>(path: P) -> Result<Recipe> {
        let content = Self::read(path.as_ref())?;
        Self::parse_recipe(&content)
    }

    /// Parse a recipe and check it against its schema revision
    pub fn parse_recipe(content: &str) -> Result<Recipe> {
        let recipe: Recipe = toml::from_str(content)
            .map_err(|e| RkjmError::ConfigError(format!("Invalid recipe TOML: {e}")))?;

        recipe.validate().map_err(RkjmError::ValidationError)?;

        Ok(recipe)
    }

    /// Save a recipe as TOML
    pub fn save_recipe<P: AsRef<Path>>(recipe: &Recipe, path: P) -> Result<()> {
        let path = path.as_ref();

        recipe.validate().map_err(RkjmError::ValidationError)?;

        let content = toml::to_string_pretty(recipe).map_err(|e| {
            RkjmError::ConfigError(format!("Failed to serialize recipe: {e}"))
        })?;

        fs::write(path, content).map_err(|e| {
            RkjmError::ConfigError(format!("Failed to write {}: {}", path.display(), e))
        })?;

        Ok(())
    }

    /// Load a package catalog from a TOML file
    pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog> {
        let content = Self::read(path.as_ref())?;
        toml::from_str(&content)
            .map_err(|e| RkjmError::ConfigError(format!("Invalid catalog TOML: {e}")))
    }

    /// Load and validate a module configuration from a YAML file
    pub fn load_module_config<P: AsRef<Path>>(path: P) -> Result<ModuleConfig> {
        let content = Self::read(path.as_ref())?;
        Self::parse_module_config(&content)
    }

    /// Parse a module configuration from YAML
    pub fn parse_module_config(content: &str) -> Result<ModuleConfig> {
        let config: ModuleConfig = serde_yaml::from_str(content)
            .map_err(|e| RkjmError::ConfigError(format!("Invalid module config: {e}")))?;

        config.validate().map_err(RkjmError::ValidationError)?;

        Ok(config)
    }

    fn read(path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(RkjmError::FileNotFound(path.to_path_buf()));
        }

        fs::read_to_string(path).map_err(|e| {
            RkjmError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })
    }
}

pub fn get_recipe_path() -> PathBuf {
    PathBuf::from("recipe.toml")
}

pub fn get_catalog_path() -> PathBuf {
    PathBuf::from("catalog.toml")
}
