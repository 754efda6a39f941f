//! Configuration loading functionality

use super::format::ConfigFormat;
use crate::error::Result;
use crate::lazy::{from_json, ConfigDict, Lazy};
use std::path::Path;
use tracing::debug;

/// Load a configuration dict from a file
///
/// The format is automatically detected from the file extension.
pub fn load_dict(path: impl AsRef<Path>) -> Result<ConfigDict> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    let dict = from_json(format.read(&content)?)?;
    debug!(path = %path.display(), ?format, entries = dict.len(), "loaded configuration");
    Ok(dict)
}

/// Load a lazy node from its tagged dict form, flat or nested
///
/// # Example
///
/// ```no_run
/// use lazyconf::io::load_config;
///
/// let lazy = load_config("linear.yaml").unwrap();
/// println!("{lazy}");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<Lazy> {
    Lazy::from_dict(&load_dict(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_dict(dir.path().join("absent.yaml")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_load_rejects_non_mapping() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.yaml");
        std::fs::write(&path, "- 1\n- 2\n").unwrap();
        assert!(matches!(load_dict(&path), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_load_config_unknown_class() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"_class": "elsewhere::Model", "x": 1}"#).unwrap();
        assert_eq!(
            load_config(&path).unwrap_err(),
            Error::Import("elsewhere::Model".to_string())
        );
    }

    #[test]
    fn test_load_flat_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flat.yaml");
        std::fs::write(
            &path,
            "_class: lazyconf::testing::Model\nsub._class: lazyconf::testing::Submodel\nsub.y: 7\n",
        )
        .unwrap();
        crate::lazy::register::<crate::testing::Model>();

        let lazy = load_config(&path).unwrap();
        let sub = lazy.get("sub").unwrap().and_then(|v| v.as_lazy()).unwrap();
        assert_eq!(sub.get("y").unwrap(), Some(&crate::Value::Int(7)));
    }
}
