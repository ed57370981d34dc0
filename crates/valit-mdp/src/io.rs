use std::{fs, path::Path};

use crate::{MdpError, MdpSpec, TabularMdp};

/// Load an MDP spec from YAML on disk.
pub fn load_yaml(path: impl AsRef<Path>) -> Result<MdpSpec, MdpError> {
    let yaml = fs::read_to_string(path)?;
    let spec: MdpSpec = serde_yaml::from_str(&yaml)?;
    Ok(spec)
}

/// Load and compile an MDP from a YAML file.
pub fn compile_yaml(path: impl AsRef<Path>) -> Result<TabularMdp, MdpError> {
    let spec = load_yaml(path)?;
    spec.compile()
}

/// Parse and compile an MDP from YAML text.
pub fn compile_yaml_str(yaml: &str) -> Result<TabularMdp, MdpError> {
    let spec: MdpSpec = serde_yaml::from_str(yaml)?;
    spec.compile()
}

/// Serialize and write an MDP spec to YAML.
pub fn save_yaml(path: impl AsRef<Path>, spec: &MdpSpec) -> Result<(), MdpError> {
    let yaml = serde_yaml::to_string(spec)?;
    fs::write(path, yaml)?;
    Ok(())
}
