//! The process supervisor: spawn, track, kill, and remove child processes.
//!
//! The record table is the single source of truth, mutated only through the
//! supervisor. Table access is cheap (append a line, set a status) and is
//! never held across child I/O; each child gets one draining task per output
//! stream so a full pipe can never stall an unobserved process.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{broadcast, oneshot};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

use crate::error::{ProcError, Result};
use crate::record::{
    Launch, OutputLine, OutputStream, ProcEvent, ProcId, ProcStatus, ProcessSnapshot,
};

// ---------------------------------------------------------------------------
// Record (table entry)
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Record {
    command: String,
    pid: Option<u32>,
    started_at: String,
    completed_at: Option<String>,
    status: ProcStatus,
    output: Vec<OutputLine>,
    /// Present while the child is running; taken on the first kill request.
    kill_tx: Option<oneshot::Sender<()>>,
}

impl Record {
    fn new(command: String) -> Self {
        Record {
            command,
            pid: None,
            started_at: Utc::now().to_rfc3339(),
            completed_at: None,
            status: ProcStatus::Running,
            output: Vec::new(),
            kill_tx: None,
        }
    }

    fn snapshot(&self, id: ProcId) -> ProcessSnapshot {
        ProcessSnapshot {
            id,
            command: self.command.clone(),
            pid: self.pid,
            started_at: self.started_at.clone(),
            completed_at: self.completed_at.clone(),
            status: self.status.clone(),
            output: self.output.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

struct Inner {
    table: Mutex<BTreeMap<ProcId, Record>>,
    next_id: AtomicU64,
    event_tx: broadcast::Sender<ProcEvent>,
}

/// Owns all spawned-process state for the lifetime of the application.
///
/// Cheap to clone; all clones share one record table and one notification
/// channel.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Inner>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(1024);
        Supervisor {
            inner: Arc::new(Inner {
                table: Mutex::new(BTreeMap::new()),
                next_id: AtomicU64::new(1),
                event_tx,
            }),
        }
    }

    /// Start a child process and return its record id without waiting for
    /// anything. The pid is recorded as soon as it is known; a spawn failure
    /// becomes an immediately-terminal `Failed` record rather than an error.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, launch: Launch) -> ProcId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut record = Record::new(launch.display_command());

        let mut cmd = Command::new(&launch.program);
        cmd.args(&launch.args)
            .envs(launch.env.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &launch.cwd {
            cmd.current_dir(cwd);
        }

        match cmd.spawn() {
            Err(e) => {
                warn!(id, error = %e, "spawn failed");
                record.status = ProcStatus::Failed {
                    reason: format!(
                        "failed to spawn '{}': {e}",
                        launch.program.to_string_lossy()
                    ),
                };
                record.completed_at = Some(Utc::now().to_rfc3339());
                self.inner.lock_table().insert(id, record);
            }
            Ok(child) => {
                let (kill_tx, kill_rx) = oneshot::channel();
                record.pid = child.id();
                record.kill_tx = Some(kill_tx);
                debug!(id, pid = ?record.pid, command = %record.command, "spawned");
                self.inner.lock_table().insert(id, record);

                let inner = Arc::clone(&self.inner);
                tokio::spawn(monitor(inner, id, child, kill_rx));
            }
        }

        self.inner.notify(id);
        id
    }

    /// Insert an already-terminal record, e.g. the history entry for a
    /// foreground invocation that the caller waited on directly.
    pub fn record_completed(
        &self,
        launch: &Launch,
        started_at: DateTime<Utc>,
        status: ProcStatus,
    ) -> ProcId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut record = Record::new(launch.display_command());
        record.started_at = started_at.to_rfc3339();
        record.completed_at = Some(Utc::now().to_rfc3339());
        record.status = if status.is_terminal() {
            status
        } else {
            // A history entry must not masquerade as a live process.
            ProcStatus::Failed {
                reason: "recorded without a terminal status".into(),
            }
        };
        self.inner.lock_table().insert(id, record);
        self.inner.notify(id);
        id
    }

    /// Request termination of a running child. Asynchronous: the `Killed`
    /// transition is observed later via the notification stream. Calling on
    /// an already-terminal record is a no-op.
    pub fn kill(&self, id: ProcId) -> Result<()> {
        let kill_tx = {
            let mut table = self.inner.lock_table();
            let record = table.get_mut(&id).ok_or(ProcError::NotFound(id))?;
            if record.status.is_terminal() {
                return Ok(());
            }
            record.kill_tx.take()
        };
        if let Some(tx) = kill_tx {
            debug!(id, "kill requested");
            let _ = tx.send(());
        }
        Ok(())
    }

    /// Discard a terminal record. Rejected on a running one: kill first.
    pub fn remove(&self, id: ProcId) -> Result<()> {
        {
            let mut table = self.inner.lock_table();
            match table.get(&id) {
                None => return Err(ProcError::NotFound(id)),
                Some(record) if !record.status.is_terminal() => {
                    return Err(ProcError::RemoveLive(id))
                }
                Some(_) => {
                    table.remove(&id);
                }
            }
        }
        self.inner.notify(id);
        Ok(())
    }

    pub fn snapshot(&self, id: ProcId) -> Option<ProcessSnapshot> {
        self.inner
            .lock_table()
            .get(&id)
            .map(|record| record.snapshot(id))
    }

    /// All records, ordered by id.
    pub fn snapshots(&self) -> Vec<ProcessSnapshot> {
        self.inner
            .lock_table()
            .iter()
            .map(|(id, record)| record.snapshot(*id))
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProcEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Stream-style subscription for `StreamExt` consumers.
    pub fn event_stream(&self) -> BroadcastStream<ProcEvent> {
        BroadcastStream::new(self.subscribe())
    }

    /// Best-effort shutdown: signal every still-running child. Termination
    /// is observed later, like any other kill.
    pub fn shutdown(&self) {
        let pending: Vec<oneshot::Sender<()>> = {
            let mut table = self.inner.lock_table();
            table
                .values_mut()
                .filter_map(|record| record.kill_tx.take())
                .collect()
        };
        if !pending.is_empty() {
            info!(count = pending.len(), "signalling running children at shutdown");
        }
        for tx in pending {
            let _ = tx.send(());
        }
    }
}

impl Inner {
    fn lock_table(&self) -> MutexGuard<'_, BTreeMap<ProcId, Record>> {
        // A poisoned lock only means some other thread panicked mid-update;
        // the table itself is still usable.
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self, id: ProcId) {
        let _ = self.event_tx.send(ProcEvent { id });
    }

    fn append(&self, id: ProcId, stream: OutputStream, text: String) {
        {
            let mut table = self.lock_table();
            let Some(record) = table.get_mut(&id) else {
                return;
            };
            record.output.push(OutputLine { stream, text });
        }
        self.notify(id);
    }

    fn finish(&self, id: ProcId, status: ProcStatus) {
        {
            let mut table = self.lock_table();
            let Some(record) = table.get_mut(&id) else {
                return;
            };
            // Terminal states are final.
            if record.status.is_terminal() {
                return;
            }
            record.status = status;
            record.completed_at = Some(Utc::now().to_rfc3339());
            record.kill_tx = None;
            debug!(id, status = %record.status, "finished");
        }
        self.notify(id);
    }
}

// ---------------------------------------------------------------------------
// Per-child tasks
// ---------------------------------------------------------------------------

async fn monitor(inner: Arc<Inner>, id: ProcId, mut child: Child, mut kill_rx: oneshot::Receiver<()>) {
    let stdout_task = child
        .stdout
        .take()
        .map(|out| tokio::spawn(drain(Arc::clone(&inner), id, out, OutputStream::Stdout)));
    let stderr_task = child
        .stderr
        .take()
        .map(|err| tokio::spawn(drain(Arc::clone(&inner), id, err, OutputStream::Stderr)));

    let mut killed = false;
    let status = tokio::select! {
        status = child.wait() => status,
        _ = &mut kill_rx => {
            killed = true;
            let _ = child.start_kill();
            child.wait().await
        }
    };

    // The terminal transition must become visible only after every line the
    // child produced has been appended and notified.
    if let Some(task) = stdout_task {
        let _ = task.await;
    }
    if let Some(task) = stderr_task {
        let _ = task.await;
    }

    let status = match status {
        Ok(st) => {
            if killed {
                ProcStatus::Killed
            } else {
                match st.code() {
                    Some(code) => ProcStatus::Exited { code },
                    // Terminated by a signal we did not send.
                    None => ProcStatus::Killed,
                }
            }
        }
        Err(e) => ProcStatus::Failed {
            reason: format!("wait failed: {e}"),
        },
    };
    inner.finish(id, status);
}

async fn drain<R>(inner: Arc<Inner>, id: ProcId, reader: R, stream: OutputStream)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(text)) = lines.next_line().await {
        inner.append(id, stream, text);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sh(script: &str) -> Launch {
        let mut launch = Launch::new("sh");
        launch.args = vec!["-c".into(), script.into()];
        launch
    }

    /// Drive the event stream until the record reaches a terminal status.
    async fn wait_terminal(sup: &Supervisor, id: ProcId) -> ProcessSnapshot {
        let mut rx = sup.subscribe();
        loop {
            if let Some(snap) = sup.snapshot(id) {
                if snap.status.is_terminal() {
                    return snap;
                }
            }
            match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
                Ok(Ok(_)) => continue,
                Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
                Ok(Err(broadcast::error::RecvError::Closed)) => panic!("event channel closed"),
                Err(_) => panic!("timed out waiting for terminal status"),
            }
        }
    }

    #[tokio::test]
    async fn spawn_captures_output_and_exit() {
        let sup = Supervisor::new();
        let id = sup.spawn(sh("echo hello"));

        let snap = wait_terminal(&sup, id).await;
        assert_eq!(snap.status, ProcStatus::Exited { code: 0 });
        assert_eq!(
            snap.output,
            vec![OutputLine {
                stream: OutputStream::Stdout,
                text: "hello".into()
            }]
        );
        assert!(snap.pid.is_some());
        assert!(snap.completed_at.is_some());
    }

    #[tokio::test]
    async fn exit_code_is_recorded() {
        let sup = Supervisor::new();
        let id = sup.spawn(sh("exit 3"));
        let snap = wait_terminal(&sup, id).await;
        assert_eq!(snap.status, ProcStatus::Exited { code: 3 });
    }

    #[tokio::test]
    async fn terminal_status_observed_after_all_output() {
        let sup = Supervisor::new();
        // Subscribe before spawning: once an event shows the record
        // terminal, every line written before exit must already be there.
        let mut rx = sup.subscribe();
        let id = sup.spawn(sh("echo one; echo two; exit 3"));

        let snap = loop {
            match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
                Ok(Ok(event)) => {
                    assert_eq!(event.id, id);
                    let snap = sup.snapshot(id).expect("record exists");
                    if snap.status.is_terminal() {
                        break snap;
                    }
                }
                Ok(Err(e)) => panic!("event stream error: {e}"),
                Err(_) => panic!("timed out waiting for events"),
            }
        };

        assert_eq!(snap.status, ProcStatus::Exited { code: 3 });
        let texts: Vec<&str> = snap.output.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn stderr_lines_are_tagged() {
        let sup = Supervisor::new();
        let id = sup.spawn(sh("echo out; echo err >&2"));
        let snap = wait_terminal(&sup, id).await;

        let stdout: Vec<&str> = snap
            .output
            .iter()
            .filter(|l| l.stream == OutputStream::Stdout)
            .map(|l| l.text.as_str())
            .collect();
        let stderr: Vec<&str> = snap
            .output
            .iter()
            .filter(|l| l.stream == OutputStream::Stderr)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(stdout, vec!["out"]);
        assert_eq!(stderr, vec!["err"]);
    }

    #[tokio::test]
    async fn per_stream_order_is_preserved() {
        let sup = Supervisor::new();
        let id = sup.spawn(sh("echo a; echo x >&2; echo b; echo y >&2; echo c"));
        let snap = wait_terminal(&sup, id).await;

        let stdout: Vec<&str> = snap
            .output
            .iter()
            .filter(|l| l.stream == OutputStream::Stdout)
            .map(|l| l.text.as_str())
            .collect();
        let stderr: Vec<&str> = snap
            .output
            .iter()
            .filter(|l| l.stream == OutputStream::Stderr)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(stdout, vec!["a", "b", "c"]);
        assert_eq!(stderr, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn spawn_failure_becomes_failed_record() {
        let sup = Supervisor::new();
        let id = sup.spawn(Launch::new("__no_such_program_xyz__"));
        let snap = wait_terminal(&sup, id).await;
        match snap.status {
            ProcStatus::Failed { ref reason } => {
                assert!(reason.contains("__no_such_program_xyz__"), "reason: {reason}");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn kill_transitions_to_killed_once() {
        let sup = Supervisor::new();
        let id = sup.spawn(sh("sleep 5"));

        sup.kill(id).unwrap();
        let snap = wait_terminal(&sup, id).await;
        assert_eq!(snap.status, ProcStatus::Killed);

        // Second kill on a terminal record is a no-op.
        sup.kill(id).unwrap();
        assert_eq!(sup.snapshot(id).unwrap().status, ProcStatus::Killed);
    }

    #[tokio::test]
    async fn kill_unknown_id_is_not_found() {
        let sup = Supervisor::new();
        assert!(matches!(sup.kill(999), Err(ProcError::NotFound(999))));
    }

    #[tokio::test]
    async fn remove_rejects_running_records() {
        let sup = Supervisor::new();
        let id = sup.spawn(sh("sleep 5"));

        assert!(matches!(sup.remove(id), Err(ProcError::RemoveLive(i)) if i == id));

        sup.kill(id).unwrap();
        wait_terminal(&sup, id).await;

        sup.remove(id).unwrap();
        assert!(sup.snapshot(id).is_none());
        assert!(matches!(sup.remove(id), Err(ProcError::NotFound(_))));
    }

    #[tokio::test]
    async fn ids_are_monotonic_and_unique() {
        let sup = Supervisor::new();
        let a = sup.spawn(sh("true"));
        let b = sup.spawn(sh("true"));
        let c = sup.spawn(sh("true"));
        assert!(a < b && b < c);

        wait_terminal(&sup, a).await;
        wait_terminal(&sup, b).await;
        wait_terminal(&sup, c).await;

        // Removing a record never frees its id for reuse.
        sup.remove(a).unwrap();
        let d = sup.spawn(sh("true"));
        assert!(d > c);
        wait_terminal(&sup, d).await;
    }

    #[tokio::test]
    async fn snapshots_are_ordered_by_id() {
        let sup = Supervisor::new();
        let ids = vec![
            sup.spawn(sh("true")),
            sup.spawn(sh("true")),
            sup.spawn(sh("true")),
        ];
        for id in &ids {
            wait_terminal(&sup, *id).await;
        }
        let listed: Vec<ProcId> = sup.snapshots().iter().map(|s| s.id).collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn concurrent_children_all_complete() {
        let sup = Supervisor::new();
        let ids: Vec<ProcId> = (0..10)
            .map(|n| sup.spawn(sh(&format!("echo line-{n}"))))
            .collect();

        for (n, id) in ids.iter().enumerate() {
            let snap = wait_terminal(&sup, *id).await;
            assert_eq!(snap.status, ProcStatus::Exited { code: 0 });
            assert_eq!(snap.output[0].text, format!("line-{n}"));
        }
    }

    #[tokio::test]
    async fn record_completed_inserts_terminal_history() {
        let sup = Supervisor::new();
        let launch = sh("true");
        let id = sup.record_completed(&launch, Utc::now(), ProcStatus::Exited { code: 7 });

        let snap = sup.snapshot(id).unwrap();
        assert_eq!(snap.status, ProcStatus::Exited { code: 7 });
        assert!(snap.completed_at.is_some());
        sup.remove(id).unwrap();
    }

    #[tokio::test]
    async fn shutdown_signals_running_children() {
        let sup = Supervisor::new();
        let a = sup.spawn(sh("sleep 5"));
        let b = sup.spawn(sh("sleep 5"));

        sup.shutdown();

        assert_eq!(wait_terminal(&sup, a).await.status, ProcStatus::Killed);
        assert_eq!(wait_terminal(&sup, b).await.status, ProcStatus::Killed);
    }
}
