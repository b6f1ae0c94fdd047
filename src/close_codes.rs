//! Close codes sent by the lobby service and their classification.
//!
//! The lobby reuses the WebSocket close code to tell the client *why* the
//! connection ended. Only two codes carry meaning for the client; everything
//! else is an unexpected disconnection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normal, intentional closure (RFC 6455).
pub const NORMAL: u16 = 1000;

/// No close frame was received (RFC 6455 reserved code, never sent on the wire).
pub const ABNORMAL: u16 = 1006;

/// The lobby session or its access token expired; the caller must log in again.
pub const SESSION_EXPIRED: u16 = 4020;

/// A close event observed on the lobby connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseEvent {
    /// Close code from the close frame.
    pub code: u16,
    /// Close reason from the close frame (may be empty).
    pub reason: String,
    /// `true` when a close frame was exchanged, `false` when the stream dropped.
    pub was_clean: bool,
}

impl CloseEvent {
    /// A close event for a received close frame.
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
            was_clean: true,
        }
    }

    /// A close event for a stream that ended without a close frame.
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self {
            code: ABNORMAL,
            reason: reason.into(),
            was_clean: false,
        }
    }

    /// Classify this close event by its code.
    pub fn kind(&self) -> CloseKind {
        CloseKind::from_code(self.code)
    }
}

impl fmt::Display for CloseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "{} (clean: {})", self.code, self.was_clean)
        } else {
            write!(
                f,
                "{} {:?} (clean: {})",
                self.code, self.reason, self.was_clean
            )
        }
    }
}

/// What a close code means for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseKind {
    /// Code `4020`: the credential or lobby session expired.
    ReauthenticationRequired,
    /// Code `1000`: the connection was closed on purpose.
    Normal,
    /// Any other code, including an abnormal drop.
    Unexpected,
}

impl CloseKind {
    /// Classify a raw close code.
    pub fn from_code(code: u16) -> Self {
        match code {
            SESSION_EXPIRED => Self::ReauthenticationRequired,
            NORMAL => Self::Normal,
            _ => Self::Unexpected,
        }
    }

    /// Returns a human-readable description of this classification.
    pub fn description(&self) -> &'static str {
        match self {
            Self::ReauthenticationRequired => {
                "The lobby session has expired. Obtain a new access token and reconnect."
            }
            Self::Normal => "The connection was closed normally.",
            Self::Unexpected => {
                "The connection was lost unexpectedly. Reconnecting is up to the caller."
            }
        }
    }
}

impl fmt::Display for CloseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReauthenticationRequired => "REAUTHENTICATION_REQUIRED",
            Self::Normal => "NORMAL",
            Self::Unexpected => "UNEXPECTED",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn session_expired_requires_reauthentication() {
        assert_eq!(
            CloseKind::from_code(4020),
            CloseKind::ReauthenticationRequired
        );
    }

    #[test]
    fn normal_closure() {
        assert_eq!(CloseKind::from_code(1000), CloseKind::Normal);
        assert_eq!(CloseEvent::new(1000, "bye").kind(), CloseKind::Normal);
    }

    #[test]
    fn everything_else_is_unexpected() {
        for code in [1001, 1006, 1011, 4000, 4999] {
            assert_eq!(CloseKind::from_code(code), CloseKind::Unexpected, "{code}");
        }
    }

    #[test]
    fn abnormal_close_is_not_clean() {
        let close = CloseEvent::abnormal("stream ended");
        assert_eq!(close.code, ABNORMAL);
        assert!(!close.was_clean);
        assert_eq!(close.kind(), CloseKind::Unexpected);
    }

    #[test]
    fn display_includes_reason_when_present() {
        assert_eq!(CloseEvent::new(1000, "").to_string(), "1000 (clean: true)");
        assert_eq!(
            CloseEvent::new(4020, "token expired").to_string(),
            "4020 \"token expired\" (clean: true)"
        );
    }

    #[test]
    fn every_kind_has_a_description() {
        for kind in [
            CloseKind::ReauthenticationRequired,
            CloseKind::Normal,
            CloseKind::Unexpected,
        ] {
            assert!(!kind.description().is_empty());
        }
    }
}
