use super::FormatError;
use serde::Serialize;

/// Serialize to YAML
pub fn to_yaml<T: Serialize>(value: &T) -> Result<String, FormatError> {
    serde_yaml::to_string(value).map_err(FormatError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Package;

    #[test]
    fn test_to_yaml() {
        let pkg = Package {
            name: "p".to_string(),
            go_files: vec!["a.go".to_string()],
            ..Default::default()
        };

        let yaml = to_yaml(&pkg).unwrap();
        assert!(yaml.contains("Name: p"));
        assert!(yaml.contains("GoFiles:"));
        assert!(yaml.contains("- a.go"));
    }
}
