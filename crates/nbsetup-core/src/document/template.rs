// Device-type template files: one YAML file per model, named from the
// manufacturer's `device_type` list.

use std::path::Path;

use serde::Deserialize;

use super::{opt_scalar, scalar};
use crate::error::CoreError;

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceTypeTemplate {
    #[serde(deserialize_with = "scalar")]
    pub model: String,
    #[serde(deserialize_with = "scalar")]
    pub slug: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub part_number: Option<String>,
    pub u_height: Option<f64>,
    pub is_full_depth: Option<bool>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceTemplate>,
    #[serde(default, rename = "console-ports")]
    pub console_ports: Vec<PortTemplate>,
    #[serde(default, rename = "power-ports")]
    pub power_ports: Vec<PortTemplate>,
    /// Numbered front ports; each number also yields a rear port of the
    /// same name.
    #[serde(default)]
    pub front_port: Vec<PortRange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceTemplate {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub descr: Option<String>,
    pub mgmt_only: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortTemplate {
    #[serde(deserialize_with = "scalar")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortRange {
    pub start_port: u32,
    pub end_port: u32,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Read `file` from the template directory.
pub fn load_template(dir: &Path, file: &str) -> Result<DeviceTypeTemplate, CoreError> {
    let path = dir.join(file);
    let text = std::fs::read_to_string(&path).map_err(|e| CoreError::Template {
        path: path.clone(),
        message: e.to_string(),
    })?;
    serde_yaml::from_str(&text).map_err(|e| CoreError::Template {
        path,
        message: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn loads_template_with_port_ranges() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ws-c3850.yml"),
            r"
model: WS-C3850-24T
slug: ws-c3850-24t
part_number: WS-C3850-24T
interfaces:
  - {name: Gi1/0/1, type: 1000base-t}
  - {name: Gi0/0, type: 1000base-t, mgmt_only: true}
console-ports:
  - {name: con0, type: rj-45}
front_port:
  - {start_port: 1, end_port: 4, type: lc}
",
        )
        .unwrap();

        let tmpl = load_template(dir.path(), "ws-c3850.yml").unwrap();
        assert_eq!(tmpl.model, "WS-C3850-24T");
        assert_eq!(tmpl.interfaces.len(), 2);
        assert_eq!(tmpl.interfaces[1].mgmt_only, Some(true));
        assert_eq!(tmpl.console_ports[0].name, "con0");
        assert!(tmpl.power_ports.is_empty());
        assert_eq!(tmpl.front_port[0].end_port, 4);
    }

    #[test]
    fn missing_file_is_template_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_template(dir.path(), "absent.yml").unwrap_err();
        assert!(matches!(err, CoreError::Template { .. }));
    }
}
