//! Wake-ups on log file modification.
//!
//! The dashboard sleeps until the log changes. [`ChangeWatcher`] is the seam;
//! [`NotifyWatcher`] implements it with the platform's native file watching
//! through the `notify` crate.

use core::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};

use log::{debug, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;

/// Blocking source of change notifications
pub trait ChangeWatcher {
    type Error: fmt::Debug;

    /// Block until at least one modification arrives.
    ///
    /// Returns how many events were coalesced into this wake-up. Exactly one
    /// ingest and render cycle should follow each call.
    fn wait_for_change(&mut self) -> Result<usize, Self::Error>;
}

#[derive(Debug, Error)]
pub enum WatchError {
    /// The watch could not be registered
    #[error("failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The watcher backend could not be created
    #[error("file watcher backend error: {0}")]
    Backend(#[from] notify::Error),

    /// The backend thread went away
    #[error("file watcher stopped delivering events")]
    Disconnected,
}

/// [`ChangeWatcher`] for a single file
pub struct NotifyWatcher {
    path: PathBuf,
    events: Receiver<notify::Result<Event>>,
    // Dropping the watcher stops event delivery
    _watcher: RecommendedWatcher,
}

impl NotifyWatcher {
    /// Start watching `path` for modifications
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, WatchError> {
        let path = path.into();
        let (tx, events) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx)?;
        watcher
            .watch(&path, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Watch {
                path: path.clone(),
                source,
            })?;

        debug!("watching {} for modifications", path.display());
        Ok(Self {
            path,
            events,
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Non-blocking variant of [`ChangeWatcher::wait_for_change`].
    ///
    /// Returns the number of modifications pending, 0 when none.
    pub fn poll_change(&mut self) -> Result<usize, WatchError> {
        drain(&self.events)
    }
}

impl ChangeWatcher for NotifyWatcher {
    type Error = WatchError;

    fn wait_for_change(&mut self) -> Result<usize, WatchError> {
        loop {
            let event = self.events.recv().map_err(|_| WatchError::Disconnected)?;
            if is_modification(event) {
                let coalesced = 1 + drain(&self.events)?;
                debug!("{}: {} modification(s)", self.path.display(), coalesced);
                return Ok(coalesced);
            }
        }
    }
}

fn is_modification(event: notify::Result<Event>) -> bool {
    match event {
        Ok(event) => matches!(event.kind, EventKind::Modify(_)),
        Err(e) => {
            warn!("file watcher reported an error: {e}");
            false
        }
    }
}

/// Count queued modifications without blocking
fn drain(events: &Receiver<notify::Result<Event>>) -> Result<usize, WatchError> {
    let mut count = 0;
    loop {
        match events.try_recv() {
            Ok(event) => {
                if is_modification(event) {
                    count += 1;
                }
            }
            Err(TryRecvError::Empty) => return Ok(count),
            Err(TryRecvError::Disconnected) if count > 0 => return Ok(count),
            Err(TryRecvError::Disconnected) => return Err(WatchError::Disconnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, DataChange, ModifyKind};
    use std::io::Write;
    use std::thread;
    use std::time::{Duration, Instant};

    fn modify() -> notify::Result<Event> {
        Ok(Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Any))))
    }

    #[test]
    fn test_drain_counts_only_modifications() {
        let (tx, rx) = mpsc::channel();
        tx.send(modify()).unwrap();
        tx.send(Ok(Event::new(EventKind::Access(AccessKind::Any))))
            .unwrap();
        tx.send(modify()).unwrap();
        tx.send(Err(notify::Error::generic("spurious"))).unwrap();

        assert_eq!(drain(&rx).unwrap(), 2);
        assert_eq!(drain(&rx).unwrap(), 0);
    }

    #[test]
    fn test_drain_reports_disconnect_when_idle() {
        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
        drop(tx);
        assert!(matches!(drain(&rx), Err(WatchError::Disconnected)));
    }

    #[test]
    fn test_missing_file_cannot_be_watched() {
        let dir = tempfile::tempdir().unwrap();
        let result = NotifyWatcher::new(dir.path().join("absent.log"));
        assert!(matches!(result, Err(WatchError::Watch { .. })));
    }

    #[test]
    fn test_append_is_observed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut watcher = NotifyWatcher::new(file.path()).unwrap();
        assert_eq!(watcher.poll_change().unwrap(), 0);

        writeln!(file, "12:00:00,21.00,990.00,45.00").unwrap();
        file.flush().unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = 0;
        while seen == 0 && Instant::now() < deadline {
            seen = watcher.poll_change().unwrap();
            thread::sleep(Duration::from_millis(20));
        }
        assert!(seen >= 1, "no modification observed");
    }
}
