//! Application configuration — built once in `init_app`, read-only afterward.
//!
//! Every field has a default so the JS bridge only needs to pass what differs
//! per deployment (usually just `public_url`). Storage keys are derived from
//! the namespace so two deployments on one origin never share a jar.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::jar::Point;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JarConfig {
    /// Deployment path prefix (e.g. "/starjar"). Empty at the origin root.
    pub public_url: String,
    /// Cache-buster appended to every asset URL; bump when assets change.
    pub build_version: String,
    /// Schema string written to the `version` key.
    pub storage_version: String,
    /// Width and height of the square mask raster.
    pub raster_size: u32,
    /// Star size: corner-test box edge and minimum center separation.
    pub item_size: f64,
    /// Minimum mask alpha (0-255) for a pixel to count as inside the jar.
    pub alpha_threshold: u8,
    /// Rejection-sampling attempt budget per placement.
    pub max_attempts: u32,
    /// Point returned when sampling gives up or the mask is missing.
    pub fallback: Point,
    pub shake_iterations: u32,
    /// Full width of the per-step shake perturbation (each axis moves by
    /// up to half of this in either direction).
    pub shake_amplitude: f64,
    /// Static confirmation phrase for a full reset. Not access control.
    pub reset_secret: String,
    /// Image substituted when an item's own image fails to load.
    pub default_image: String,
}

impl Default for JarConfig {
    fn default() -> Self {
        Self {
            public_url: String::new(),
            build_version: "2025-08-11-1".to_string(),
            storage_version: "1".to_string(),
            raster_size: 300,
            item_size: 32.0,
            alpha_threshold: 50,
            max_attempts: 1000,
            fallback: Point::new(150.0, 180.0),
            shake_iterations: 8,
            shake_amplitude: 20.0,
            reset_secret: "kakalove0608".to_string(),
            default_image: "/stars/default.PNG".to_string(),
        }
    }
}

impl JarConfig {
    /// Parse a JSON config object. An empty string yields the defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.raster_size == 0 {
            return Err(ConfigError::Invalid("raster_size must be positive".into()));
        }
        if !(self.item_size > 0.0) {
            return Err(ConfigError::Invalid("item_size must be positive".into()));
        }
        if self.reset_secret.is_empty() {
            return Err(ConfigError::Invalid("reset_secret must not be empty".into()));
        }
        Ok(())
    }

    pub fn namespace(&self) -> String {
        format!("{}:starjar", self.public_url)
    }

    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys::new(&self.namespace())
    }

    /// Resolve a relative asset path against the deployment path, with the
    /// build version as cache-buster.
    pub fn asset(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{}/{}?v={}", self.public_url, path, self.build_version)
    }
}

/// The four localStorage keys the app owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub stars: String,
    pub unlocked: String,
    pub version: String,
    pub intro: String,
}

impl StorageKeys {
    pub fn new(namespace: &str) -> Self {
        Self {
            stars: format!("{namespace}:jarStars"),
            unlocked: format!("{namespace}:unlockedCompliments"),
            version: format!("{namespace}:version"),
            intro: format!("{namespace}:introDismissed"),
        }
    }

    /// Whether a cross-tab change to `key` affects the collection.
    /// `None` is a full `localStorage.clear()`.
    pub fn is_collection_key(&self, key: Option<&str>) -> bool {
        match key {
            None => true,
            Some(k) => k == self.stars || k == self.unlocked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_by_public_url() {
        let config = JarConfig {
            public_url: "/gift".to_string(),
            ..JarConfig::default()
        };
        let keys = config.storage_keys();
        assert_eq!(keys.stars, "/gift:starjar:jarStars");
        assert_eq!(keys.unlocked, "/gift:starjar:unlockedCompliments");
        assert_eq!(keys.version, "/gift:starjar:version");
        assert_eq!(keys.intro, "/gift:starjar:introDismissed");
    }

    #[test]
    fn asset_adds_cache_buster() {
        let config = JarConfig::default();
        assert_eq!(config.asset("/stars/pink1.PNG"), "/stars/pink1.PNG?v=2025-08-11-1");
        assert_eq!(config.asset("jar/lid.PNG"), "/jar/lid.PNG?v=2025-08-11-1");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = JarConfig::from_json(r#"{"public_url":"/x","max_attempts":10}"#).unwrap();
        assert_eq!(config.public_url, "/x");
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.raster_size, 300);
        assert_eq!(config.fallback, Point::new(150.0, 180.0));
    }

    #[test]
    fn empty_json_is_default() {
        let config = JarConfig::from_json("").unwrap();
        assert_eq!(config.storage_version, "1");
    }

    #[test]
    fn rejects_zero_raster() {
        assert!(JarConfig::from_json(r#"{"raster_size":0}"#).is_err());
    }

    #[test]
    fn collection_key_filter() {
        let keys = StorageKeys::new(":starjar");
        assert!(keys.is_collection_key(Some(":starjar:jarStars")));
        assert!(keys.is_collection_key(Some(":starjar:unlockedCompliments")));
        assert!(keys.is_collection_key(None));
        assert!(!keys.is_collection_key(Some(":starjar:introDismissed")));
        assert!(!keys.is_collection_key(Some("other")));
    }
}
