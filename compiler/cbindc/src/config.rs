//! Project configuration: one JSON file naming the headers, the translation
//! rules and the generated package.

use std::fs;
use std::path::{Path, PathBuf};

use cbind_gen::GeneratorConfig;
use cbind_parse::ParserConfig;
use cbind_translate::TranslatorConfig;
use serde::Deserialize;

use crate::DriverError;

/// Headers to parse and where their quoted includes live.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserSection {
    pub targets: Vec<PathBuf>,
    pub include_paths: Vec<PathBuf>,
}

/// The whole project file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub generator: GeneratorConfig,
    pub parser: ParserSection,
    pub translator: TranslatorConfig,
}

impl ProjectConfig {
    /// Read `path` and resolve relative parser paths against its directory.
    pub fn load(path: &Path) -> Result<Self, DriverError> {
        let text = fs::read_to_string(path).map_err(|source| DriverError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_json(&text, base).map_err(|err| match err {
            DriverError::Json { source, .. } => DriverError::Json {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse a project from JSON text, resolving relative paths against `base`.
    pub fn from_json(text: &str, base: &Path) -> Result<Self, DriverError> {
        let mut config: ProjectConfig =
            serde_json::from_str(text).map_err(|source| DriverError::Json {
                path: PathBuf::new(),
                source,
            })?;
        config.resolve(base);
        config.validate()?;
        Ok(config)
    }

    /// Parser configuration with every path resolved.
    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig {
            targets: self.parser.targets.clone(),
            include_paths: self.parser.include_paths.clone(),
        }
    }

    fn resolve(&mut self, base: &Path) {
        for path in self
            .parser
            .targets
            .iter_mut()
            .chain(self.parser.include_paths.iter_mut())
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        // without explicit includes the preamble names the parsed headers
        if self.generator.includes.is_empty() {
            self.generator.includes = self
                .parser
                .targets
                .iter()
                .filter_map(|target| target.file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .collect();
        }
    }

    fn validate(&self) -> Result<(), DriverError> {
        let package = self.generator.package.as_str();
        if package.is_empty() {
            return Err(DriverError::Invalid("generator.package is required".to_string()));
        }
        if !package
            .chars()
            .all(|c| c == '_' || c.is_ascii_alphanumeric())
            || package.starts_with(|c: char| c.is_ascii_digit())
        {
            return Err(DriverError::Invalid(format!(
                "generator.package `{package}` is not a Go package name"
            )));
        }
        if self.parser.targets.is_empty() {
            return Err(DriverError::Invalid("parser.targets is empty".to_string()));
        }
        Ok(())
    }
}
