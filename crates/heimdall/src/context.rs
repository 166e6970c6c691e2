//! Agent context: the attribute source behind span enrichment.
//!
//! Five fixed attributes are stamped on every span at start time, read
//! fresh for each span so location changes and session rotation show up
//! immediately without touching spans already started.

use std::sync::{Arc, RwLock};

use heimdall_trace::{AttrMap, AttrValue, AttributeSource};

use crate::session::SessionTracker;

/// Current page URL.
pub const KEY_LOCATION: &str = "location.href";
/// Session identifier.
pub const KEY_SESSION_ID: &str = "heimdall.sessionId";
/// Agent version.
pub const KEY_VERSION: &str = "heimdall.version";
/// Application name.
pub const KEY_APP: &str = "app";
/// Agent instance identifier, minted per init.
pub const KEY_INSTANCE_ID: &str = "heimdall.instanceId";

/// Version stamped on every span.
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Mutable agent state read at span start.
pub struct AgentContext {
    instance_id: String,
    app: String,
    session: Arc<SessionTracker>,
    location: RwLock<String>,
    globals: RwLock<AttrMap>,
}

impl AgentContext {
    pub fn new(instance_id: String, app: String, session: Arc<SessionTracker>) -> Self {
        Self {
            instance_id,
            app,
            session,
            location: RwLock::new(String::new()),
            globals: RwLock::new(AttrMap::new()),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn session_id(&self) -> String {
        self.session.id()
    }

    /// Record the current page URL; spans started after this carry it.
    pub fn update_location(&self, url: impl Into<String>) {
        if let Ok(mut location) = self.location.write() {
            *location = url.into();
        }
    }

    /// Replace the global attribute set wholesale. Spans already started
    /// keep whatever was stamped on them.
    pub fn set_global_attributes(&self, attributes: AttrMap) {
        if let Ok(mut globals) = self.globals.write() {
            *globals = attributes;
        }
    }

    pub fn global_attributes(&self) -> AttrMap {
        self.globals
            .read()
            .map(|globals| globals.clone())
            .unwrap_or_default()
    }
}

impl AttributeSource for AgentContext {
    fn attributes(&self) -> Vec<(String, AttrValue)> {
        let location = self
            .location
            .read()
            .map(|l| l.clone())
            .unwrap_or_default();

        // Fixed attributes first; globals follow so they win on collision.
        let mut attributes = vec![
            (KEY_LOCATION.to_string(), location.into()),
            (KEY_SESSION_ID.to_string(), self.session.id().into()),
            (KEY_VERSION.to_string(), AGENT_VERSION.into()),
            (KEY_APP.to_string(), self.app.clone().into()),
            (KEY_INSTANCE_ID.to_string(), self.instance_id.clone().into()),
        ];
        if let Ok(globals) = self.globals.read() {
            attributes.extend(globals.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::new_instance_id;

    fn test_context() -> AgentContext {
        AgentContext::new(
            new_instance_id(),
            "shop".to_string(),
            Arc::new(SessionTracker::new()),
        )
    }

    #[test]
    fn test_fixed_attributes_present() {
        let context = test_context();
        context.update_location("https://app.test/cart");

        let attributes: AttrMap = context.attributes().into_iter().collect();
        assert_eq!(attributes[KEY_LOCATION], "https://app.test/cart".into());
        assert_eq!(attributes[KEY_APP], "shop".into());
        assert_eq!(attributes[KEY_VERSION], AGENT_VERSION.into());
        assert_eq!(
            attributes[KEY_INSTANCE_ID],
            context.instance_id().to_string().into()
        );
        assert_eq!(attributes[KEY_SESSION_ID], context.session_id().into());
    }

    #[test]
    fn test_globals_follow_fixed() {
        let context = test_context();
        context.set_global_attributes(AttrMap::from([(
            KEY_APP.to_string(),
            "override".into(),
        )]));

        let attributes = context.attributes();
        let last_app = attributes
            .iter()
            .filter(|(k, _)| k == KEY_APP)
            .next_back()
            .cloned();
        assert_eq!(last_app, Some((KEY_APP.to_string(), "override".into())));
    }

    #[test]
    fn test_set_replaces_the_whole_map() {
        let context = test_context();
        context.set_global_attributes(AttrMap::from([("team".to_string(), "web".into())]));
        context.set_global_attributes(AttrMap::from([("release".to_string(), 7i64.into())]));

        let globals = context.global_attributes();
        assert!(!globals.contains_key("team"));
        assert_eq!(globals["release"], 7i64.into());
    }
}
