//! Session and instance identity.
//!
//! The instance id is minted once per `init` and never changes for the life
//! of that agent instance. The session id outlives page loads conceptually
//! but not here; it rotates when the session ages out or goes idle, and
//! every span read observes the current one.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;
use uuid::Uuid;

const MAX_SESSION_AGE: Duration = Duration::from_secs(4 * 60 * 60);
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Mint a 16-hex agent instance identifier.
pub fn new_instance_id() -> String {
    Uuid::new_v4().simple().to_string()[..16].to_string()
}

fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Rotation limits for a session.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Hard cap on session age regardless of activity.
    pub max_age: Duration,
    /// Idle time after which the session rotates.
    pub inactivity_timeout: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_age: MAX_SESSION_AGE,
            inactivity_timeout: INACTIVITY_TIMEOUT,
        }
    }
}

struct SessionState {
    id: String,
    started_at: Instant,
    last_activity: Instant,
}

/// Tracks the current session id, rotating it on expiry.
pub struct SessionTracker {
    limits: SessionLimits,
    state: Mutex<SessionState>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::with_limits(SessionLimits::default())
    }

    pub fn with_limits(limits: SessionLimits) -> Self {
        let now = Instant::now();
        Self {
            limits,
            state: Mutex::new(SessionState {
                id: new_session_id(),
                started_at: now,
                last_activity: now,
            }),
        }
    }

    /// Current session id. Reading counts as activity; an expired session
    /// is replaced before the id is returned.
    pub fn id(&self) -> String {
        let now = Instant::now();
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };

        let aged_out = now.duration_since(state.started_at) >= self.limits.max_age;
        let idle = now.duration_since(state.last_activity) >= self.limits.inactivity_timeout;
        if aged_out || idle {
            state.id = new_session_id();
            state.started_at = now;
            debug!(session_id = %state.id, aged_out, idle, "session rotated");
        }
        state.last_activity = now;
        state.id.clone()
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}
