//! Page URL overrides for the aquarium configuration

use aquarium_core::AquariumConfig;
use tracing::Level;

/// Values read from `?fish=`, `?seed=`, `?visible=` and `?log=`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOverrides {
    pub fish: Option<usize>,
    pub seed: Option<u64>,
    pub visible: Option<usize>,
    pub log: Option<Level>,
}

/// Parse a query parameter from a search string
pub fn parse_query_param(search: &str, param: &str) -> Option<String> {
    let search = search.trim_start_matches('?');
    for pair in search.split('&') {
        let mut parts = pair.splitn(2, '=');
        if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
            if key == param {
                return Some(value.to_string());
            }
        }
    }
    None
}

fn parse_level(value: &str) -> Option<Level> {
    match value.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

impl QueryOverrides {
    /// Read overrides from a `location.search` string; unparsable values are dropped
    pub fn from_search(search: &str) -> Self {
        let param = |name| parse_query_param(search, name);
        Self {
            fish: param("fish").and_then(|v| v.parse().ok()),
            seed: param("seed").and_then(|v| v.parse().ok()),
            visible: param("visible").and_then(|v| v.parse().ok()),
            log: param("log").and_then(|v| parse_level(&v)),
        }
    }

    /// `base` with the overrides applied, or `base` unchanged if the result
    /// does not validate
    pub fn apply(&self, base: AquariumConfig) -> AquariumConfig {
        let mut config = base.clone();
        if let Some(fish) = self.fish {
            config.fish.max = fish;
            config.fish.initial_visible = config.fish.initial_visible.min(fish);
        }
        if let Some(seed) = self.seed {
            config.fish.seed = Some(seed);
        }
        if let Some(visible) = self.visible {
            config.fish.initial_visible = visible;
        }

        match config.validate() {
            Ok(()) => config,
            Err(err) => {
                tracing::warn!(%err, overrides = ?self, "Ignoring URL overrides");
                base
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_param() {
        let search = "?fish=100&seed=7&log=debug";
        assert_eq!(parse_query_param(search, "fish"), Some("100".to_string()));
        assert_eq!(parse_query_param(search, "log"), Some("debug".to_string()));
        assert_eq!(parse_query_param(search, "visible"), None);
        assert_eq!(parse_query_param("", "fish"), None);
    }

    #[test]
    fn test_from_search() {
        let overrides = QueryOverrides::from_search("?fish=100&seed=7&visible=20&log=INFO");
        assert_eq!(
            overrides,
            QueryOverrides {
                fish: Some(100),
                seed: Some(7),
                visible: Some(20),
                log: Some(Level::INFO),
            }
        );

        let junk = QueryOverrides::from_search("?fish=lots&log=loud");
        assert_eq!(junk, QueryOverrides::default());
    }

    #[test]
    fn test_smaller_school_lowers_initial_count() {
        let overrides = QueryOverrides::from_search("?fish=40");
        let config = overrides.apply(AquariumConfig::default());
        assert_eq!(config.fish.max, 40);
        assert_eq!(config.fish.initial_visible, 40);
    }

    #[test]
    fn test_invalid_overrides_keep_base() {
        let overrides = QueryOverrides::from_search("?fish=10&visible=50");
        let base = AquariumConfig::default();
        let config = overrides.apply(base.clone());
        assert_eq!(config, base);
    }

    #[test]
    fn test_oversized_school_keeps_base() {
        let base = AquariumConfig::default();
        let config = QueryOverrides::from_search("?fish=100000000").apply(base.clone());
        assert_eq!(config, base);
    }

    #[test]
    fn test_seed_override() {
        let config = QueryOverrides::from_search("?seed=42").apply(AquariumConfig::default());
        assert_eq!(config.fish.seed, Some(42));
    }
}
