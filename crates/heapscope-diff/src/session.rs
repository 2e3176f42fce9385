use std::time::SystemTime;

use heapscope_core::ActivityFlag;
use heapscope_heap::SnapshotSource;

use crate::differ::GraphDiffer;
use crate::report::DiffReport;

/// Contract violations of the diff session lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The session was already finalized; the snapshots it held are gone
    /// and re-running the comparison would read released memory.
    #[error("attempt to end a heap diff that was already ended")]
    AlreadyEnded,

    #[error("failed to capture heap snapshot")]
    Capture(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A two-phase heap measurement window.
///
/// [`start`](HeapDiff::start) captures the "before" snapshot;
/// [`end`](HeapDiff::end) captures "after", diffs the pair and releases
/// both snapshots immediately. A process being measured for memory
/// problems should not have the measurement pin two full heap graphs any
/// longer than necessary. Ending twice is rejected with
/// [`DiffError::AlreadyEnded`].
///
/// The differ's activity flag is raised while either snapshot is being
/// captured and while the comparison runs, so collection events caused by
/// the measurement itself can be suppressed upstream.
pub struct HeapDiff<S: SnapshotSource> {
    source: S,
    differ: GraphDiffer,
    before: Option<S::Snapshot>,
    started_at: SystemTime,
    ended: bool,
}

impl<S: SnapshotSource> HeapDiff<S> {
    /// Open a measurement window with a default [`GraphDiffer`].
    pub fn start(source: S) -> Result<Self, DiffError> {
        Self::start_with(source, GraphDiffer::new())
    }

    /// Open a measurement window using a caller-configured differ.
    pub fn start_with(mut source: S, differ: GraphDiffer) -> Result<Self, DiffError> {
        let started_at = SystemTime::now();
        let before = {
            let _in_flight = differ.activity().enter();
            source
                .capture()
                .map_err(|err| DiffError::Capture(Box::new(err)))?
        };

        Ok(Self {
            source,
            differ,
            before: Some(before),
            started_at,
            ended: false,
        })
    }

    /// Handle to the flag raised while this session captures or compares.
    pub fn activity(&self) -> ActivityFlag {
        self.differ.activity()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Close the window: capture "after", compare, release both snapshots.
    pub fn end(&mut self) -> Result<DiffReport, DiffError> {
        if self.ended {
            return Err(DiffError::AlreadyEnded);
        }
        self.ended = true;

        let before = self.before.take().ok_or(DiffError::AlreadyEnded)?;

        let after = {
            let _in_flight = self.differ.activity().enter();
            match self.source.capture() {
                Ok(after) => after,
                Err(err) => {
                    self.source.release(before);
                    return Err(DiffError::Capture(Box::new(err)));
                }
            }
        };

        let ended_at = SystemTime::now();
        let report = self.differ.diff(&before, &after, self.started_at, ended_at);

        self.source.release(before);
        self.source.release(after);

        Ok(report)
    }
}

impl<S: SnapshotSource> Drop for HeapDiff<S> {
    fn drop(&mut self) {
        // An abandoned session still owes its source the "before" release.
        if let Some(before) = self.before.take() {
            self.source.release(before);
        }
    }
}
