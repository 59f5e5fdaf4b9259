//! `--config` file loading.
//!
//! ```toml
//! [validate]
//! collect_all_errors = false
//! max_depth = 16
//! ```

use formlogic_core::ValidateOptions;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    validate: ValidateOptions,
}

/// Resolve validation options from an optional config file plus flags.
/// Flags win over the file.
pub(crate) fn load_options(path: Option<&Path>, first_error: bool) -> Result<ValidateOptions, String> {
    let mut options = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)
                .map_err(|e| format!("error reading config '{}': {}", p.display(), e))?;
            parse_options(&content)
                .map_err(|e| format!("error parsing config '{}': {}", p.display(), e))?
        }
        None => ValidateOptions::default(),
    };
    if first_error {
        options.collect_all_errors = false;
    }
    Ok(options)
}

fn parse_options(content: &str) -> Result<ValidateOptions, toml::de::Error> {
    let file: ConfigFile = toml::from_str(content)?;
    Ok(file.validate)
}
