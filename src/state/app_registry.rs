use rustc_hash::FxHashMap;

use crate::config::AppConfig;

/// Published model name to Bailian application lookup.
#[derive(Debug, Default)]
pub struct AppRegistry {
    apps: FxHashMap<String, AppConfig>,
    order: Vec<String>,
}

impl AppRegistry {
    /// Index `apps` by model name. Later duplicates are ignored; validation
    /// rejects them before this point.
    #[must_use]
    pub fn new(apps: &[AppConfig]) -> Self {
        let mut registry = Self {
            apps: FxHashMap::with_capacity_and_hasher(apps.len(), Default::default()),
            order: Vec::with_capacity(apps.len()),
        };
        for app in apps {
            if registry.apps.contains_key(&app.model) {
                continue;
            }
            registry.order.push(app.model.clone());
            registry.apps.insert(app.model.clone(), app.clone());
        }
        registry
    }

    #[must_use]
    pub fn resolve(&self, model: &str) -> Option<&AppConfig> {
        self.apps.get(model)
    }

    /// Apps in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &AppConfig> {
        self.order.iter().filter_map(|model| self.apps.get(model))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_model_name() {
        let registry = AppRegistry::new(&[AppConfig::new("a", "app-a"), AppConfig::new("b", "app-b")]);
        assert_eq!(registry.resolve("b").map(|app| app.app_id.as_str()), Some("app-b"));
        assert!(registry.resolve("c").is_none());
        assert!(registry.resolve("A").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_iter_keeps_config_order_and_first_duplicate() {
        let registry = AppRegistry::new(&[
            AppConfig::new("z", "1"),
            AppConfig::new("a", "2"),
            AppConfig::new("z", "3"),
        ]);
        let ids: Vec<_> = registry.iter().map(|app| app.app_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
