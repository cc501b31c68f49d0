//! The process-wide session slot.
//!
//! The engine is a single global runtime, so hosts normally install exactly
//! one session at startup and every map view reaches it through [`global`].

use parking_lot::RwLock;

use super::Session;
use crate::error::{Error, Result};

static GLOBAL: RwLock<Option<Session>> = parking_lot::const_rwlock(None);

/// Installs `session` as the process-wide session, returning the previous one.
pub fn install(session: Session) -> Option<Session> {
	GLOBAL.write().replace(session)
}

/// Returns the installed session, or `CONTEXT_ERROR` if there is none.
pub fn global() -> Result<Session> {
	GLOBAL.read().clone().ok_or_else(|| {
		Error::Context("map session accessed outside its provider scope; install a session first".to_string())
	})
}

pub fn uninstall() -> Option<Session> {
	GLOBAL.write().take()
}
