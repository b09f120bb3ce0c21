//! Prefix → handler table, built once and shared read-only.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::platform::PlatformError;

/// Executes one action class.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Runs the action with the text after its prefix and returns a short
    /// description of what happened.
    async fn handle(&self, params: &str) -> Result<String, PlatformError>;
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
    order: Vec<String>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `prefix`. The first registration of a prefix
    /// wins; later ones are refused and `false` is returned.
    pub fn register(&mut self, prefix: &str, handler: Arc<dyn ActionHandler>) -> bool {
        if self.handlers.contains_key(prefix) {
            log::warn!("chain: handler for '{prefix}' already registered, ignoring");
            return false;
        }
        self.handlers.insert(prefix.to_owned(), handler);
        self.order.push(prefix.to_owned());
        true
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.handlers.contains_key(prefix)
    }

    pub fn get(&self, prefix: &str) -> Option<&Arc<dyn ActionHandler>> {
        self.handlers.get(prefix)
    }

    /// Registered prefixes in registration order.
    pub fn prefixes(&self) -> &[String] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Reply(&'static str);

    #[async_trait]
    impl ActionHandler for Reply {
        async fn handle(&self, _: &str) -> Result<String, PlatformError> {
            Ok(self.0.to_owned())
        }
    }

    #[tokio::test]
    async fn first_registration_wins() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.register("click:", Arc::new(Reply("first"))));
        assert!(!registry.register("click:", Arc::new(Reply("second"))));

        let out = registry.get("click:").unwrap().handle("").await.unwrap();
        assert_eq!(out, "first");
        assert_eq!(registry.prefixes(), ["click:"]);
    }

    #[test]
    fn lookup_is_exact() {
        let mut registry = HandlerRegistry::new();
        registry.register("click", Arc::new(Reply("here")));
        assert!(registry.contains("click"));
        assert!(!registry.contains("click:"));
        assert!(registry.get("cli").is_none());
    }
}
