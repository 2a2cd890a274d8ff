use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Frame the scene is evaluated at before exporting
    pub frame: f32,
    pub normals: bool,
    pub texcos: bool,
    /// Prepended to every material name in the OBJ/MTL output
    pub material_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame: 0.0,
            normals: true,
            texcos: true,
            material_prefix: String::new(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let config: Config = toml::from_str("frame = 12.5").unwrap();
        assert_eq!(config.frame, 12.5);
        assert!(config.normals);
        assert_eq!(config.material_prefix, "");
    }
}
