use serde::{Deserialize, Serialize};

/// `modules.directory` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct DirectoryConfig {
    pub max_search_results: u64,
    pub max_full_name_length: usize,
    /// Random avatars are `<avatar_base_url>/<1..=100>.png`.
    pub avatar_base_url: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            max_search_results: 50,
            max_full_name_length: 100,
            avatar_base_url: "https://avatar.iran.liara.run/public".to_string(),
        }
    }
}
