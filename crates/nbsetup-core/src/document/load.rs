use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::InputDocument;
use crate::error::CoreError;

fn input_error(path: &Path, message: impl ToString) -> CoreError {
    CoreError::Input {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn is_yaml(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"))
}

/// Load every `*.yml` / `*.yaml` file in `dir` (sorted by name) and merge
/// their top-level keys into one document. A key declared in a later file
/// replaces the earlier one.
pub fn load_dir(dir: &Path) -> Result<InputDocument, CoreError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| input_error(dir, e))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| is_yaml(path))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(input_error(dir, "no .yml or .yaml files found"));
    }

    let mut merged = serde_yaml::Mapping::new();
    for file in &files {
        debug!(file = %file.display(), "loading input file");
        let text = fs::read_to_string(file).map_err(|e| input_error(file, e))?;
        match serde_yaml::from_str::<serde_yaml::Value>(&text).map_err(|e| input_error(file, e))? {
            serde_yaml::Value::Mapping(map) => {
                for (key, value) in map {
                    merged.insert(key, value);
                }
            }
            serde_yaml::Value::Null => {}
            _ => return Err(input_error(file, "top level must be a mapping")),
        }
    }

    serde_yaml::from_value(serde_yaml::Value::Mapping(merged)).map_err(|e| input_error(dir, e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn merges_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("01_org.yml"),
            "tenant:\n  - name: Acme\nrack_role:\n  - name: Network\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("02_override.yaml"),
            "rack_role:\n  - name: Compute\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let doc = load_dir(dir.path()).unwrap();
        assert_eq!(doc.tenant.unwrap()[0].name, "Acme");
        assert_eq!(doc.rack_role.unwrap()[0].name, "Compute");
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no .yml or .yaml files"), "{err}");
    }

    #[test]
    fn malformed_document_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.yml"), "- just\n- a list\n").unwrap();
        let err = load_dir(dir.path()).unwrap_err();
        assert!(
            matches!(&err, CoreError::Input { path, .. } if path.ends_with("bad.yml")),
            "{err:?}"
        );
    }
}
