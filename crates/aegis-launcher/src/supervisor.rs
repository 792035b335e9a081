//! Session lifecycle supervision
//!
//! One logical session per (project, tool-kind) pair. The registry enforces
//! the at-most-one-live-handle invariant: launching a key that already has a
//! running process tears the old one down and awaits its termination before
//! the new one starts. A launch request that arrives while another launch
//! for the same key is still in flight is coalesced into it. Stop is
//! idempotent and can cancel a launch that has not finished resolving.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use aegis_process::{ProcessConfig, ProcessManager};
use tokio::process::{ChildStderr, ChildStdin, ChildStdout};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{LauncherError, Result};
use crate::report::Reporter;
use crate::types::{CommandSpec, SessionEvent, SessionKey, SessionState, ToolKind};

/// Stdio handles of a piped child, handed to the host's client machinery
///
/// The language-server transport is the child's stdin/stdout pair; the host
/// adapter owns the handles and is responsible for pumping them. Dropping
/// them closes the pipes.
pub struct SessionIo {
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
    pub stderr: Option<ChildStderr>,
}

struct Session {
    id: u64,
    state: SessionState,
    cancel: CancellationToken,
    // Cancelled by the watcher once the child has fully terminated, so
    // stop and relaunch can await termination without owning the task.
    done: CancellationToken,
    pid: Option<u32>,
}

type SessionMap = Arc<Mutex<HashMap<SessionKey, Session>>>;

/// Supervises tool sessions keyed by (project, tool-kind)
pub struct SessionSupervisor {
    sessions: SessionMap,
    manager: ProcessManager,
    reporter: Arc<dyn Reporter>,
    events: mpsc::UnboundedSender<SessionEvent>,
    next_id: AtomicU64,
}

impl SessionSupervisor {
    /// Create a supervisor and the event stream it publishes on
    pub fn new(reporter: Arc<dyn Reporter>) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sessions: Arc::new(Mutex::new(HashMap::new())),
                manager: ProcessManager::new(),
                reporter,
                events,
                next_id: AtomicU64::new(1),
            },
            receiver,
        )
    }

    /// Current state for a key; Idle when no session exists
    pub async fn state(&self, key: &SessionKey) -> SessionState {
        let sessions = self.sessions.lock().await;
        sessions.get(key).map(|s| s.state).unwrap_or(SessionState::Idle)
    }

    /// Launch a session, resolving the command under the session's
    /// cancellation token
    ///
    /// `resolve` receives the token so a concurrent stop can abort the
    /// resolution steps. Any live process for `key` is stopped and awaited
    /// first. Errors are routed to the reporter (cancellation excepted) and
    /// also returned.
    ///
    /// For piped sessions (language servers) the child's stdio handles are
    /// returned so the host can wire up its transport; run-profile sessions
    /// inherit stdio and return `None`.
    pub async fn launch<F, Fut>(&self, key: SessionKey, resolve: F) -> Result<Option<SessionIo>>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<CommandSpec>>,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let done = CancellationToken::new();

        // Phase 1: claim the key. Tear down a prior live session first so
        // the new process never overlaps the old one.
        let previous = {
            let mut sessions = self.sessions.lock().await;

            if let Some(existing) = sessions.get(&key) {
                if existing.state == SessionState::Launching
                    || existing.state == SessionState::Resolving
                {
                    debug!(key = ?key, "Launch already in flight, coalescing");
                    return Ok(None);
                }
            }

            let previous = sessions.remove(&key);
            sessions.insert(
                key.clone(),
                Session {
                    id,
                    state: SessionState::Resolving,
                    cancel: cancel.clone(),
                    done: done.clone(),
                    pid: None,
                },
            );
            previous
        };

        if let Some(old) = previous {
            self.teardown(&key, old).await;
        }

        // Phase 2: resolve outside the lock, under the session token.
        let spec = match resolve(cancel.clone()).await {
            Ok(spec) => spec,
            Err(e) => {
                self.abandon(&key, id).await;
                return Err(self.reported(e));
            }
        };

        if cancel.is_cancelled() {
            self.abandon(&key, id).await;
            return Err(LauncherError::Cancelled);
        }

        {
            let mut sessions = self.sessions.lock().await;
            match sessions.get_mut(&key) {
                Some(session) if session.id == id => session.state = SessionState::Launching,
                _ => return Err(LauncherError::Cancelled),
            }
        }

        // Phase 3: spawn and hand off to the watcher.
        let config = spec_to_config(&key.kind, &spec);
        let mut child = match self.manager.spawn(config) {
            Ok(child) => child,
            Err(e) => {
                self.abandon(&key, id).await;
                return Err(self.reported(LauncherError::LaunchFailed(e.to_string())));
            }
        };
        let pid = child.pid();

        // Hand the transport to the caller before the watcher takes the
        // child; nothing else may drain these pipes.
        let io = match key.kind {
            ToolKind::LanguageServer => match (child.stdin(), child.stdout()) {
                (Some(stdin), Some(stdout)) => Some(SessionIo {
                    stdin,
                    stdout,
                    stderr: child.stderr(),
                }),
                _ => {
                    let _ = child.shutdown().await;
                    self.abandon(&key, id).await;
                    return Err(self.reported(LauncherError::LaunchFailed(
                        "child stdio was not captured".to_string(),
                    )));
                }
            },
            ToolKind::Build | ToolKind::Watch => None,
        };

        info!(key = ?key, pid = pid, "Tool session running");
        // Publish Started before the watcher exists so a fast-exiting child
        // cannot emit its terminal event first.
        let _ = self.events.send(SessionEvent::Started {
            key: key.clone(),
            pid,
        });

        let watcher = {
            let sessions = Arc::clone(&self.sessions);
            let reporter = Arc::clone(&self.reporter);
            let events = self.events.clone();
            let key = key.clone();
            let cancel = cancel.clone();
            let done = done.clone();

            tokio::spawn(async move {
                let outcome = tokio::select! {
                    _ = cancel.cancelled() => {
                        if let Err(e) = child.shutdown().await {
                            warn!(key = ?key, error = %e, "Error stopping tool process");
                        }
                        (SessionState::Stopped, None, false)
                    }
                    status = child.wait() => match status {
                        Ok(status) if status.success() => {
                            (SessionState::Stopped, status.code(), false)
                        }
                        Ok(status) => (SessionState::Crashed, status.code(), true),
                        Err(e) => {
                            warn!(key = ?key, error = %e, "Error awaiting tool process");
                            (SessionState::Crashed, None, true)
                        }
                    },
                };

                let (state, code, crashed) = outcome;
                {
                    let mut sessions = sessions.lock().await;
                    // A relaunch may have replaced this session already;
                    // only the owning watcher updates it.
                    if let Some(session) = sessions.get_mut(&key) {
                        if session.id == id {
                            session.state = state;
                            session.pid = None;
                        }
                    }
                }

                if crashed {
                    let err = LauncherError::ProcessCrashed { code };
                    reporter.report(
                        err.severity(),
                        err.title(),
                        &format!(
                            "The {} for {:?} exited unexpectedly (code {:?}). \
                             It will not restart automatically; reopen a file or \
                             run the restart command to relaunch it.",
                            key.kind.label(),
                            key.project_root,
                            code
                        ),
                    );
                    let _ = events.send(SessionEvent::Crashed { key, code });
                } else {
                    let _ = events.send(SessionEvent::Stopped { key });
                }

                // Last: anyone awaiting termination may now proceed.
                done.cancel();
            })
        };

        // Phase 4: publish the running session, unless a stop removed the
        // placeholder while we were spawning.
        {
            let mut sessions = self.sessions.lock().await;
            match sessions.get_mut(&key) {
                Some(session) if session.id == id => {
                    // The watcher may have recorded a terminal state already
                    // if the child exited immediately.
                    if session.state == SessionState::Launching {
                        session.state = SessionState::Running;
                        session.pid = Some(pid);
                    }
                }
                _ => {
                    cancel.cancel();
                    drop(sessions);
                    let _ = watcher.await;
                    return Err(LauncherError::Cancelled);
                }
            }
        }

        Ok(io)
    }

    /// Stop the session for a key and await process termination
    ///
    /// Absent or already-stopped sessions are a no-op with no report. A
    /// session still resolving is cancelled; its launch call observes the
    /// cancellation and cleans up.
    pub async fn stop(&self, key: &SessionKey) -> Result<()> {
        let done = {
            let mut sessions = self.sessions.lock().await;
            let Some(session) = sessions.get_mut(key) else {
                return Ok(());
            };

            match session.state {
                SessionState::Stopped | SessionState::Crashed | SessionState::Idle => {
                    return Ok(());
                }
                SessionState::Resolving | SessionState::Launching => {
                    debug!(key = ?key, "Cancelling in-flight launch");
                    session.cancel.cancel();
                    return Ok(());
                }
                SessionState::Running => {
                    session.cancel.cancel();
                    // The session entry stays in the map so a concurrent
                    // relaunch still finds a termination signal to await.
                    session.done.clone()
                }
            }
        };

        done.cancelled().await;
        debug!(key = ?key, "Tool session stopped");
        Ok(())
    }

    /// Stop every session; used on host shutdown
    pub async fn stop_all(&self) -> Result<()> {
        let keys: Vec<SessionKey> = {
            let sessions = self.sessions.lock().await;
            sessions.keys().cloned().collect()
        };
        for key in keys {
            self.stop(&key).await?;
        }
        Ok(())
    }

    /// Tear down a session taken out of the registry during relaunch
    ///
    /// Awaits the watcher's termination signal, which also covers the case
    /// where a concurrent stop is mid-flight for the same session.
    async fn teardown(&self, key: &SessionKey, old: Session) {
        old.cancel.cancel();
        debug!(key = ?key, "Waiting for previous session to terminate");
        old.done.cancelled().await;
    }

    /// Remove a failed/cancelled placeholder if it still belongs to us
    async fn abandon(&self, key: &SessionKey, id: u64) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(key) {
            if session.id == id {
                sessions.remove(key);
            }
        }
    }

    /// Route an error through the notification sink, cancellation excepted
    fn reported(&self, e: LauncherError) -> LauncherError {
        if !matches!(e, LauncherError::Cancelled) {
            self.reporter.report(e.severity(), e.title(), &e.to_string());
        }
        e
    }
}

fn spec_to_config(kind: &ToolKind, spec: &CommandSpec) -> ProcessConfig {
    let stdio = match kind {
        // The language server's stdio is the transport handed to the host
        // client machinery.
        ToolKind::LanguageServer => aegis_process::StdioMode::Piped,
        ToolKind::Build | ToolKind::Watch => aegis_process::StdioMode::Inherit,
    };

    let mut config = ProcessConfig::new(&spec.program)
        .args(spec.args.clone())
        .working_dir(&spec.working_dir)
        .stdio(stdio);
    for (k, v) in &spec.env {
        config = config.env(k, v);
    }
    config
}
