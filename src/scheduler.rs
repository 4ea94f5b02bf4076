//! Lazy-init scheduler.
//!
//! Rendered markup is inert text; behavior can only attach once that text
//! becomes live DOM. For fragments containing lazily triggered blocks, the
//! scheduler splices a zero-visual-footprint marker element into the fragment
//! and records the block names against the marker's token. When the hosting
//! environment observes the fragment's attachment it reports the token back
//! (see [`Context::fragment_attached`](crate::context::Context::fragment_attached)),
//! which fires the deferred init exactly once.
//!
//! No cancellation exists: a fragment discarded before attachment simply
//! leaves a pending record that never fires.

use std::collections::HashMap;

use log::{debug, trace};

use crate::html::{Html, HtmlElement};
use crate::render::DeferredInit;

/// Class carried by the injected marker element.
pub const MARKER_CLASS: &str = "bemark-init";

/// Attribute on the marker element holding the pending-record token.
pub const MARKER_ATTR: &str = "data-bemark-init";

/// Tracks pending attach-time init records, keyed by marker token.
#[derive(Debug, Default)]
pub struct Scheduler {
    pending: HashMap<String, DeferredInit>,
    next_token: u64,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attach marker to the fragment and record the block names as
    /// pending. Returns the extended fragment and the marker token.
    pub fn schedule(&mut self, fragment: Html, blocks: DeferredInit) -> (Html, String) {
        let token = format!("init-{}", self.next_token);
        self.next_token += 1;

        debug!("scheduling deferred init `{token}` for blocks {blocks:?}");
        self.pending.insert(token.clone(), blocks);

        let mut marker = HtmlElement::new("img");
        marker.attrs.set("class", MARKER_CLASS);
        marker.attrs.set("style", "display:none");
        marker.attrs.set(MARKER_ATTR, token.clone());

        (fragment.push(Html::Element(marker)), token)
    }

    /// Take the pending record for a token. Removes it, so each fragment
    /// fires at most once; an unknown or already-fired token yields `None`.
    pub fn take_pending(&mut self, token: &str) -> Option<DeferredInit> {
        let record = self.pending.remove(token);
        if record.is_none() {
            trace!("no pending record for token `{token}`");
        }
        record
    }

    /// Number of fragments still awaiting attachment.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop all pending records.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::html::to_html;

    fn blocks(names: &[&str]) -> DeferredInit {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn schedule_appends_marker() {
        let mut scheduler = Scheduler::new();
        let fragment = Html::Text("content".to_owned());
        let (html, token) = scheduler.schedule(fragment, blocks(&["widget"]));
        let rendered = to_html(&html);
        assert!(rendered.starts_with("content<img "));
        assert!(rendered.contains(MARKER_CLASS));
        assert!(rendered.contains(&token));
        assert!(rendered.contains("display:none"));
    }

    #[test]
    fn tokens_are_unique() {
        let mut scheduler = Scheduler::new();
        let (_, t1) = scheduler.schedule(Html::Empty, blocks(&["a"]));
        let (_, t2) = scheduler.schedule(Html::Empty, blocks(&["b"]));
        assert_ne!(t1, t2);
    }

    #[test]
    fn take_pending_is_one_shot() {
        let mut scheduler = Scheduler::new();
        let (_, token) = scheduler.schedule(Html::Empty, blocks(&["widget"]));

        let first = scheduler.take_pending(&token);
        assert_eq!(first, Some(blocks(&["widget"])));
        // Second fire never happens.
        assert_eq!(scheduler.take_pending(&token), None);
    }

    #[test]
    fn unknown_token_is_noop() {
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.take_pending("init-99"), None);
    }

    #[test]
    fn discarded_fragment_stays_pending() {
        let mut scheduler = Scheduler::new();
        let (_, _token) = scheduler.schedule(Html::Empty, blocks(&["widget"]));
        // The fragment is never attached; the record just sits there.
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn clear_drops_records() {
        let mut scheduler = Scheduler::new();
        let (_, token) = scheduler.schedule(Html::Empty, blocks(&["widget"]));
        scheduler.clear();
        assert_eq!(scheduler.take_pending(&token), None);
    }
}
