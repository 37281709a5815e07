//! Confirmation and notification center
//!
//! Notices are short messages queued for the next page the admin sees.
//! Confirmations hold an action until the admin explicitly confirms it, so
//! nothing destructive runs before the confirmation step.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AdminError, ErrorCategory};

/// Notices kept per session before the oldest are dropped
const MAX_NOTICES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::Info => "info",
            NoticeKind::Success => "success",
            NoticeKind::Warning => "warning",
            NoticeKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, title, message)
    }

    /// Blocking error notice for a failed action
    pub fn from_error(title: impl Into<String>, err: &AdminError) -> Self {
        let kind = match err.category() {
            ErrorCategory::Validation => NoticeKind::Warning,
            _ => NoticeKind::Error,
        };
        Self::new(kind, title, err.to_string())
    }
}

/// Per-session notice queue
#[derive(Debug, Default)]
pub struct Notices {
    queue: VecDeque<Notice>,
}

impl Notices {
    pub fn push(&mut self, notice: Notice) {
        if self.queue.len() >= MAX_NOTICES {
            self.queue.pop_front();
        }
        self.queue.push_back(notice);
    }

    /// Take everything queued, oldest first
    pub fn drain(&mut self) -> Vec<Notice> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// An action waiting for the admin to confirm it
#[derive(Debug, Clone)]
pub struct PendingConfirmation<A> {
    pub id: Uuid,
    pub session_token: String,
    pub title: String,
    pub message: String,
    pub kind: NoticeKind,
    pub action: A,
    created: Instant,
}

/// Pending confirmations across all sessions
pub struct ConfirmationQueue<A> {
    pending: DashMap<Uuid, PendingConfirmation<A>>,
    ttl: Duration,
}

impl<A: Clone> ConfirmationQueue<A> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            ttl,
        }
    }

    /// Park an action and return the id the confirm dialog refers to
    pub fn request(
        &self,
        session_token: &str,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NoticeKind,
        action: A,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.pending.insert(
            id,
            PendingConfirmation {
                id,
                session_token: session_token.to_string(),
                title: title.into(),
                message: message.into(),
                kind,
                action,
                created: Instant::now(),
            },
        );
        debug!("Queued confirmation {}", id);
        id
    }

    /// Look at a pending confirmation owned by this session
    pub fn peek(&self, id: Uuid, session_token: &str) -> Option<PendingConfirmation<A>> {
        self.pending
            .get(&id)
            .filter(|p| p.session_token == session_token && !self.is_stale(p))
            .map(|p| p.clone())
    }

    /// Hand the action back for execution; each confirmation runs at most once
    pub fn confirm(&self, id: Uuid, session_token: &str) -> Option<A> {
        let (_, pending) = self
            .pending
            .remove_if(&id, |_, p| p.session_token == session_token)?;
        if self.is_stale(&pending) {
            debug!("Confirmation {} expired", id);
            return None;
        }
        Some(pending.action)
    }

    /// Drop a confirmation without running it
    pub fn cancel(&self, id: Uuid, session_token: &str) -> bool {
        self.pending
            .remove_if(&id, |_, p| p.session_token == session_token)
            .is_some()
    }

    /// Forget everything a session left behind (on logout)
    pub fn clear_session(&self, session_token: &str) {
        self.pending.retain(|_, p| p.session_token != session_token);
    }

    pub fn cleanup_expired(&self) -> usize {
        let before = self.pending.len();
        let ttl = self.ttl;
        self.pending.retain(|_, p| p.created.elapsed() < ttl);
        before - self.pending.len()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    fn is_stale(&self, pending: &PendingConfirmation<A>) -> bool {
        pending.created.elapsed() >= self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_drain_in_order_and_cap() {
        let mut notices = Notices::default();
        for i in 0..(MAX_NOTICES + 2) {
            notices.push(Notice::success("Done", format!("#{}", i)));
        }
        assert_eq!(notices.len(), MAX_NOTICES);

        let drained = notices.drain();
        assert_eq!(drained.first().unwrap().message, "#2");
        assert!(notices.is_empty());
    }

    #[test]
    fn test_confirm_runs_once_for_owner_only() {
        let queue: ConfirmationQueue<&'static str> =
            ConfirmationQueue::new(Duration::from_secs(60));
        let id = queue.request("s1", "Ban user", "Ban U1?", NoticeKind::Warning, "ban-U1");

        assert!(queue.peek(id, "s2").is_none());
        assert_eq!(queue.confirm(id, "s2"), None);
        assert_eq!(queue.peek(id, "s1").unwrap().title, "Ban user");

        assert_eq!(queue.confirm(id, "s1"), Some("ban-U1"));
        assert_eq!(queue.confirm(id, "s1"), None);
    }

    #[test]
    fn test_cancel_and_clear() {
        let queue: ConfirmationQueue<u32> = ConfirmationQueue::new(Duration::from_secs(60));
        let a = queue.request("s1", "t", "m", NoticeKind::Info, 1);
        queue.request("s1", "t", "m", NoticeKind::Info, 2);
        queue.request("s2", "t", "m", NoticeKind::Info, 3);

        assert!(queue.cancel(a, "s1"));
        assert!(!queue.cancel(a, "s1"));
        queue.clear_session("s1");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_expired_confirmations() {
        let queue: ConfirmationQueue<u32> = ConfirmationQueue::new(Duration::ZERO);
        let id = queue.request("s1", "t", "m", NoticeKind::Info, 1);
        assert_eq!(queue.confirm(id, "s1"), None);

        queue.request("s1", "t", "m", NoticeKind::Info, 2);
        assert_eq!(queue.cleanup_expired(), 1);
    }

    #[test]
    fn test_notice_from_error_kind() {
        let notice = Notice::from_error("Ban failed", &AdminError::MissingToken);
        assert_eq!(notice.kind, NoticeKind::Error);
    }
}
