//! Configuration saving functionality

use super::format::ConfigFormat;
use crate::error::Result;
use crate::lazy::{to_json, ConfigDict, DictOptions, Lazy};
use std::path::Path;
use tracing::debug;

/// Save a configuration dict to a file
///
/// The format is chosen from the file extension. Annotated entries cannot
/// be written.
pub fn save_dict(path: impl AsRef<Path>, dict: &ConfigDict) -> Result<()> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let data = format.render(&to_json(dict)?)?;
    std::fs::write(path, data)?;
    debug!(path = %path.display(), ?format, "saved configuration");
    Ok(())
}

/// Save a lazy node in its tagged, nested dict form
///
/// # Example
///
/// ```no_run
/// use lazyconf::demo::Linear;
/// use lazyconf::io::save_config;
/// use lazyconf::Parsable;
///
/// save_config("linear.yaml", &Linear::as_lazy()).unwrap();
/// ```
pub fn save_config(path: impl AsRef<Path>, lazy: &Lazy) -> Result<()> {
    save_dict(path, &lazy.to_dict(DictOptions::tagged())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lazy::Entry;
    use crate::testing::Model;
    use crate::Parsable;
    use tempfile::TempDir;

    #[test]
    fn test_save_config_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.yaml");
        save_config(&path, &Model::as_lazy()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("lazyconf::testing::Model"));
        assert!(content.contains("lazyconf::testing::Submodel"));
        assert!(content.contains("y: 5"));
    }

    #[test]
    fn test_save_config_json_pretty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        save_config(&path, &Model::as_lazy()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains('\n'));
        assert!(content.contains("\"_class\""));
    }

    #[test]
    fn test_save_dict_rejects_annotations() {
        let dir = TempDir::new().unwrap();
        let dict = Model::as_lazy()
            .to_dict(DictOptions::tagged().with_annotations(true))
            .unwrap();
        assert!(save_dict(dir.path().join("model.json"), &dict).is_err());
    }

    #[test]
    fn test_save_dict_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let mut dict = ConfigDict::new();
        dict.insert("x".to_string(), Entry::Value(1.into()));
        assert!(save_dict(dir.path().join("model.toml"), &dict).is_err());
    }
}
