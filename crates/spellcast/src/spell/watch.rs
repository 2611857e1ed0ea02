//! # Spell Hot-Reload
//!
//! Edit a spell file, save it, and the next cast uses the new code:
//!
//! ```text
//!  notify thread ──events──► rx ──poll──► pending (path → last event time)
//!                                            │
//!                              quiet 100ms   ▼
//!                                   read file, compile
//!                                   ├─ ok   → Spell handed to the caller
//!                                   └─ err  → warn, previous spell stays
//! ```
//!
//! Editors save in bursts (write temp file, rename, touch), so events for a
//! path are collapsed until the path has been quiet for [`DEBOUNCE`].
//!
//! A watcher that fails to start is not an error. Spells still load through
//! [`SpellWatcher::load_all`]; they just do not reload on their own.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::library::{Spell, SpellLibrary};

/// Quiet time after the last event before a file is reloaded.
pub const DEBOUNCE: Duration = Duration::from_millis(100);

pub struct SpellWatcher {
    watcher: Option<RecommendedWatcher>,
    rx: mpsc::Receiver<notify::Result<notify::Event>>,
    /// Canonical path → spell name.
    watched: HashMap<PathBuf, String>,
    pending: HashMap<PathBuf, Instant>,
    disconnected: bool,
}

impl Default for SpellWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SpellWatcher {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let watcher = match notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        }) {
            Ok(w) => Some(w),
            Err(e) => {
                log::warn!("Failed to create file watcher: {e}. Spell hot-reload disabled.");
                None
            }
        };
        Self {
            watcher,
            rx,
            watched: HashMap::new(),
            pending: HashMap::new(),
            disconnected: false,
        }
    }

    /// Watch `path` and compile it as spell `name` when it changes. Returns
    /// `false` (after logging why) if the path cannot be watched.
    pub fn watch(&mut self, path: impl AsRef<Path>, name: impl Into<String>) -> bool {
        let path = path.as_ref();
        let canonical = match path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Cannot watch spell '{}': {e}", path.display());
                return false;
            }
        };
        if let Some(watcher) = &mut self.watcher {
            if let Err(e) = watcher.watch(&canonical, RecursiveMode::NonRecursive) {
                log::warn!("Failed to watch spell '{}': {e}", canonical.display());
                return false;
            }
        }
        let name = name.into();
        log::info!("Watching spell '{name}' at '{}'", canonical.display());
        self.watched.insert(canonical, name);
        true
    }

    pub fn is_active(&self) -> bool {
        self.watcher.is_some() && !self.disconnected
    }

    /// Compile every watched file now, changed or not.
    pub fn load_all(&mut self, library: &SpellLibrary) -> Vec<Spell> {
        self.pending.clear();
        let mut paths: Vec<_> = self.watched.keys().cloned().collect();
        paths.sort();
        paths.iter().filter_map(|p| self.compile(p, library)).collect()
    }

    /// Recompile files whose changes have settled. Only successful compiles
    /// are returned; failures are logged.
    pub fn reload(&mut self, library: &SpellLibrary) -> Vec<Spell> {
        self.poll();
        let ready = self.drain_ready(Instant::now());
        ready.iter().filter_map(|p| self.compile(p, library)).collect()
    }

    /// Move events from the watcher thread into the debounce buffer.
    fn poll(&mut self) {
        if self.disconnected {
            return;
        }
        loop {
            match self.rx.try_recv() {
                Ok(Ok(event)) => {
                    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        continue;
                    }
                    for path in &event.paths {
                        let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
                        if self.watched.contains_key(&canonical) {
                            self.pending.insert(canonical, Instant::now());
                        }
                    }
                }
                Ok(Err(e)) => log::warn!("File watcher error: {e}"),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    log::warn!("File watcher disconnected. Spell hot-reload disabled.");
                    self.disconnected = true;
                    break;
                }
            }
        }
    }

    /// Paths quiet for at least [`DEBOUNCE`] as of `now`.
    fn drain_ready(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut ready = Vec::new();
        self.pending.retain(|path, last| {
            if now.duration_since(*last) >= DEBOUNCE {
                ready.push(path.clone());
                false
            } else {
                true
            }
        });
        ready.sort();
        ready
    }

    fn compile(&self, path: &Path, library: &SpellLibrary) -> Option<Spell> {
        let name = self.watched.get(path)?;
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Cannot read spell '{}': {e}", path.display());
                return None;
            }
        };
        match library.compile_named(name, &source) {
            Ok(spell) => {
                log::info!("Reloaded spell '{name}' from '{}'", path.display());
                Some(spell)
            }
            Err(e) => {
                log::warn!("Spell '{name}' failed to compile, keeping the previous one: {e}");
                None
            }
        }
    }
}
