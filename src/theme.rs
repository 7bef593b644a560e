//! Theme sources and resolution.
//!
//! Themes are configuration only: either one of the themes syntect ships,
//! picked by id, or a `.tmTheme` file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use syntect::highlighting::{Theme, ThemeSet};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeSource {
    /// A theme bundled with syntect, e.g. `InspiredGitHub`.
    Builtin(String),
    /// A `.tmTheme` file. Registered under its file stem.
    File(PathBuf),
}

impl ThemeSource {
    /// The id the theme is registered under once loaded.
    pub fn id(&self) -> String {
        match self {
            ThemeSource::Builtin(id) => id.clone(),
            ThemeSource::File(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }
}

/// Ids of the themes syntect ships.
pub fn builtin_theme_names() -> Vec<String> {
    ThemeSet::load_defaults().themes.into_keys().collect()
}

/// Load every source into an id -> theme map.
///
/// Bundled themes are looked up in `defaults`; files are parsed on the
/// blocking pool.
pub async fn load_themes(
    sources: &[ThemeSource],
    defaults: &ThemeSet,
) -> Result<BTreeMap<String, Theme>, Error> {
    let mut themes = BTreeMap::new();
    for source in sources {
        let theme = match source {
            ThemeSource::Builtin(id) => defaults
                .themes
                .get(id)
                .cloned()
                .ok_or_else(|| Error::UnknownTheme(id.clone()))?,
            ThemeSource::File(path) => {
                let path = path.clone();
                tokio::task::spawn_blocking(move || {
                    ThemeSet::get_theme(&path).map_err(|e| Error::ResourceLoad {
                        what: "theme",
                        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()),
                        path,
                    })
                })
                .await
                .map_err(|e| Error::Interrupted {
                    task: "theme loader",
                    reason: e.to_string(),
                })??
            }
        };
        themes.insert(source.id(), theme);
    }
    Ok(themes)
}
