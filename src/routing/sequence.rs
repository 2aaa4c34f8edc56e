//! Two-pass lazy dispatch sequencing.
//!
//! A [`DispatchSequence`] walks the route table for one request and
//! yields the handlers to run, in order, without evaluating any pattern
//! before its turn comes up:
//!
//! 1. Middleware pass, reverse declaration order, route patterns in
//!    prefix mode. Every matching entry contributes its middleware
//!    handlers.
//! 2. Terminal pass, forward declaration order, route patterns exact.
//!    The first matching entry with a non-empty terminal list wins and
//!    the scan stops there.
//!
//! Laziness matters: a middleware that never calls `proceed` must not
//! pay for (or observe) matches further down the table.

use std::collections::VecDeque;
use std::sync::Arc;

use axum::http::Method;

use crate::handler::Handler;
use crate::pattern::{Params, PathMatch};

use super::table::{RouteEntry, RouteTable};

/// One handler due to run, with the request-derived values scoped to
/// its route entry.
pub struct PendingInvocation {
    pub handler: Arc<dyn Handler>,
    pub params: Params,
    pub sub_path: String,
    pub route: String,
}

enum Phase {
    Middleware,
    Terminal,
    Exhausted,
}

/// Lazy iterator over the handlers a single request dispatches to.
pub struct DispatchSequence {
    table: Arc<RouteTable>,
    method: Method,
    path: String,
    phase: Phase,
    // Counts down through the table in the middleware phase, then up in
    // the terminal phase. The middleware phase ends exactly at zero,
    // which is where the terminal scan starts.
    cursor: usize,
    queue: VecDeque<PendingInvocation>,
}

impl DispatchSequence {
    pub fn new(table: Arc<RouteTable>, method: Method, path: impl Into<String>) -> Self {
        let cursor = table.len();
        Self {
            table,
            method,
            path: path.into(),
            phase: Phase::Middleware,
            cursor,
            queue: VecDeque::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    fn enqueue(&mut self, entry: &RouteEntry, handlers: &[Arc<dyn Handler>], params: &Params, sub_path: &str) {
        for handler in handlers {
            self.queue.push_back(PendingInvocation {
                handler: Arc::clone(handler),
                params: params.clone(),
                sub_path: sub_path.to_string(),
                route: entry.name().to_string(),
            });
        }
    }
}

impl Iterator for DispatchSequence {
    type Item = PendingInvocation;

    fn next(&mut self) -> Option<PendingInvocation> {
        loop {
            if let Some(invocation) = self.queue.pop_front() {
                return Some(invocation);
            }
            match self.phase {
                Phase::Middleware => {
                    if self.cursor == 0 {
                        self.phase = Phase::Terminal;
                        continue;
                    }
                    self.cursor -= 1;
                    let table = Arc::clone(&self.table);
                    let entry = &table.entries()[self.cursor];
                    if !entry.allows(&self.method) {
                        continue;
                    }
                    let Some(route_hit) = entry.route_prefix().matches(&self.path) else {
                        continue;
                    };
                    let Some(mount_hit) = entry.mount().matches(&self.path) else {
                        continue;
                    };
                    let sub = sub_path(&self.path, &mount_hit);
                    self.enqueue(entry, entry.middleware(), &route_hit.params, &sub);
                }
                Phase::Terminal => {
                    if self.cursor >= self.table.len() {
                        self.phase = Phase::Exhausted;
                        continue;
                    }
                    let table = Arc::clone(&self.table);
                    let entry = &table.entries()[self.cursor];
                    self.cursor += 1;
                    if !entry.allows(&self.method) || entry.terminal().is_empty() {
                        continue;
                    }
                    let Some(route_hit) = entry.route_exact().matches(&self.path) else {
                        continue;
                    };
                    let Some(mount_hit) = entry.mount().matches(&self.path) else {
                        continue;
                    };
                    let sub = sub_path(&self.path, &mount_hit);
                    self.enqueue(entry, entry.terminal(), &route_hit.params, &sub);
                    // First exact match wins; later entries never run.
                    self.phase = Phase::Exhausted;
                }
                Phase::Exhausted => return None,
            }
        }
    }
}

/// Path remainder below a mount match. The matched prefix is cut off,
/// keeping the separating slash with the remainder so the result is
/// always an absolute path.
fn sub_path(path: &str, mount: &PathMatch) -> String {
    let mut cut = mount.offset + mount.text.len();
    if mount.text.ends_with('/') {
        cut -= 1;
    }
    let rest = &path[cut..];
    if rest.is_empty() {
        "/".to_string()
    } else {
        rest.to_string()
    }
}
