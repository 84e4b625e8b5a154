use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::BackendSession;

/// Observable lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionStatus::Uninitialized => "uninitialized",
            SessionStatus::Initializing => "initializing",
            SessionStatus::Ready => "ready",
            SessionStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// The live remote conversation. Only `Ready` owns a backend handle.
pub(crate) enum Session {
    Uninitialized,
    Initializing,
    Ready(Box<dyn BackendSession>),
    Failed,
}

impl Session {
    pub(crate) fn status(&self) -> SessionStatus {
        match self {
            Session::Uninitialized => SessionStatus::Uninitialized,
            Session::Initializing => SessionStatus::Initializing,
            Session::Ready(_) => SessionStatus::Ready,
            Session::Failed => SessionStatus::Failed,
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        matches!(self, Session::Ready(_))
    }

    pub(crate) fn handle_mut(&mut self) -> Option<&mut (dyn BackendSession + 'static)> {
        match self {
            Session::Ready(handle) => Some(handle.as_mut()),
            _ => None,
        }
    }

    /// Any state may start a handshake; a previous handle is dropped
    pub(crate) fn begin_initializing(self) -> Session {
        Session::Initializing
    }

    pub(crate) fn ready(self, handle: Box<dyn BackendSession>) -> Session {
        Session::Ready(handle)
    }

    pub(crate) fn fail(self) -> Session {
        Session::Failed
    }

    pub(crate) fn reset(self) -> Session {
        Session::Uninitialized
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session::{:?}", self.status())
    }
}
