//! Registry of activity handlers, built once on the worker side.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::ActivityError;

/// A boxed async activity handler: serialized input in, serialized
/// result or provider error out.
pub type ActivityHandler =
    Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<serde_json::Value, ActivityError>> + Send + Sync>;

/// Maps activity names to handlers.
///
/// Registered once before the host starts dispatching work; the host
/// shares it read-only across instances.
#[derive(Clone, Default)]
pub struct ActivityRegistry {
    handlers: HashMap<String, ActivityHandler>,
}

impl ActivityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under the given activity name, replacing
    /// any previous registration.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, ActivityError>> + Send + 'static,
    {
        self.handlers
            .insert(name.into(), Arc::new(move |input| Box::pin(handler(input))));
    }

    /// Looks up a handler by name.
    pub fn get(&self, name: &str) -> Option<ActivityHandler> {
        self.handlers.get(name).cloned()
    }

    /// Returns the registered activity names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ActivityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityRegistry")
            .field("activities", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_invoke() {
        let mut registry = ActivityRegistry::new();
        registry.register("Echo", |input| async move { Ok(input) });

        let handler = registry.get("Echo").unwrap();
        let result = handler(serde_json::json!(42)).await.unwrap();
        assert_eq!(result, serde_json::json!(42));
    }

    #[test]
    fn test_unknown_activity_is_absent() {
        let registry = ActivityRegistry::new();
        assert!(registry.get("Missing").is_none());
    }

    #[test]
    fn test_names_are_sorted() {
        let mut registry = ActivityRegistry::new();
        registry.register("NotifyAbandonment", |_| async { Ok(serde_json::Value::Null) });
        registry.register("Charge", |_| async { Ok(serde_json::Value::Null) });
        assert_eq!(registry.names(), vec!["Charge", "NotifyAbandonment"]);
    }
}
