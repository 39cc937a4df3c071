use serde::{Deserialize, Serialize};

/// Generator settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Go package name; also the stem of the output files.
    pub package: String,
    /// Headers named in the cgo preamble, e.g. `foo.h` or `<stdint.h>`.
    pub includes: Vec<String>,
    /// Package documentation.
    pub description: Option<String>,
    /// Bound of the helper channel. Unbounded when absent.
    pub helper_capacity: Option<usize>,
}

impl GeneratorConfig {
    pub fn new(package: impl Into<String>) -> Self {
        GeneratorConfig {
            package: package.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_includes<I, S>(mut self, includes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes = includes.into_iter().map(Into::into).collect();
        self
    }

    /// `#include` lines, quoting bare names.
    pub fn include_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.includes.iter().map(|include| {
            let wrapped = (include.starts_with('<') && include.ends_with('>'))
                || (include.starts_with('"') && include.ends_with('"') && include.len() > 1);
            if wrapped {
                format!("#include {include}")
            } else {
                format!("#include \"{include}\"")
            }
        })
    }
}
