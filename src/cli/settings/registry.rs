//! Registry of setting handlers.

use std::collections::HashMap;

use super::handlers::{
    api_key_handler, base_url_handler, data_dir_handler, greeting_handler, model_handler,
    resume_last_handler, IdleTimeoutHandler,
};
use super::SettingHandler;

pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
    /// Keys in display order for `hilos set` output.
    display_order: Vec<&'static str>,
}

impl SettingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            display_order: Vec::new(),
        };

        registry.register(Box::new(base_url_handler()));
        registry.register(Box::new(model_handler()));
        registry.register(Box::new(api_key_handler()));
        registry.register(Box::new(data_dir_handler()));
        registry.register(Box::new(resume_last_handler()));
        registry.register(Box::new(greeting_handler()));
        registry.register(Box::new(IdleTimeoutHandler));

        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        let key = handler.key();
        self.display_order.push(key);
        self.handlers.insert(key, handler);
    }

    /// Looks a handler up. Underscores are accepted in place of dashes so the
    /// TOML field names work too.
    pub fn get(&self, key: &str) -> Option<&dyn SettingHandler> {
        let normalized = key.trim().replace('_', "-");
        let normalized = match normalized.as_str() {
            "stream-idle-timeout-secs" => "stream-idle-timeout",
            other => other,
        };
        self.handlers.get(normalized).map(|h| h.as_ref())
    }

    pub fn keys_display_order(&self) -> &[&'static str] {
        &self.display_order
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
