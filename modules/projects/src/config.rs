use serde::{Deserialize, Serialize};

/// Configuration for the projects module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectsConfig {
    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,
    #[serde(default = "default_max_description_length")]
    pub max_description_length: usize,
    #[serde(default = "default_max_comment_length")]
    pub max_comment_length: usize,
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        Self {
            max_title_length: default_max_title_length(),
            max_description_length: default_max_description_length(),
            max_comment_length: default_max_comment_length(),
        }
    }
}

fn default_max_title_length() -> usize {
    200
}

fn default_max_description_length() -> usize {
    5000
}

fn default_max_comment_length() -> usize {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg: ProjectsConfig =
            serde_json::from_value(serde_json::json!({ "max_title_length": 80 })).unwrap();
        assert_eq!(cfg.max_title_length, 80);
        assert_eq!(cfg.max_comment_length, 2000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: Result<ProjectsConfig, _> =
            serde_json::from_value(serde_json::json!({ "max_titel_length": 80 }));
        assert!(res.is_err());
    }
}
