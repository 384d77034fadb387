/*
 * dkimoracle signing daemon
 *
 * Copyright (c) the dkimoracle authors
 * Licensed under the Apache License, Version 2.0
 *
 * You should have received a copy of the Apache License, Version 2.0 along
 * with this program. If not, see https://www.apache.org/licenses/LICENSE-2.0.
 *
 */

//! The Daemon Harness (C8, spec §4.8): binds the configured listening
//! sockets, drops privileges, optionally chroots, writes the PID file, and
//! runs the accept loop until shutdown.

use std::sync::Arc;

use tokio::net::{TcpListener, UnixListener};
use tokio::sync::watch;
use tokio::task::JoinSet;

use dkimoracle_config::DaemonSettings;

use crate::connection::{serve, Shared};
use crate::privilege;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("cannot bind TCP listener on {addr:?}: {source}")]
    BindTcp { addr: String, source: std::io::Error },
    #[error("cannot bind unix listener on {path:?}: {source}")]
    BindUnix {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Harness(#[from] privilege::HarnessError),
}

struct BoundSockets {
    tcp: Vec<TcpListener>,
    unix: Vec<UnixListener>,
}

async fn bind(settings: &DaemonSettings) -> Result<BoundSockets, RunError> {
    let mut tcp = Vec::with_capacity(settings.listen.len());
    for addr in &settings.listen {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RunError::BindTcp {
                addr: addr.clone(),
                source,
            })?;
        tracing::info!(%addr, "listening");
        tcp.push(listener);
    }

    let mut unix = Vec::with_capacity(settings.listen_unix.len());
    for path in &settings.listen_unix {
        let _ = std::fs::remove_file(path);
        let listener = UnixListener::bind(path).map_err(|source| RunError::BindUnix {
            path: path.clone(),
            source,
        })?;
        tracing::info!(%path, "listening");
        unix.push(listener);
    }

    Ok(BoundSockets { tcp, unix })
}

/// Bind sockets, drop privileges/chroot/write the PID file as configured,
/// then run the accept loop until a shutdown signal arrives. In-flight
/// requests complete before the function returns, per spec §5
/// "Cancellation: ... A shutdown signal closes the listener; in-flight
/// requests complete before exit."
///
/// # Errors
///
/// Returns [`RunError`] if a socket cannot be bound or a harness step
/// (chroot, privilege drop, PID file) fails; all are fatal at startup per
/// spec §7.
pub async fn run(settings: DaemonSettings, shared: Arc<Shared>) -> Result<(), RunError> {
    let sockets = bind(&settings).await?;

    // Chroot while still root: the chroot(2) syscall itself requires
    // CAP_SYS_CHROOT, so it must run before privileges are dropped.
    if let Some(chroot_dir) = &settings.chroot {
        if privilege::running_as_root() {
            privilege::chroot(std::path::Path::new(chroot_dir))?;
            tracing::info!(dir = %chroot_dir, "chrooted");
        }
    }

    if privilege::running_as_root() {
        privilege::drop_privileges(settings.user.as_deref(), settings.group.as_deref())?;
        tracing::info!(user = ?settings.user, group = ?settings.group, "dropped privileges");
    }

    if let Some(pid_file) = &settings.pid_file {
        privilege::write_pid_file(std::path::Path::new(pid_file))?;
        tracing::info!(path = %pid_file, "wrote pid file");
    }

    accept_loop(sockets, shared).await;
    Ok(())
}

/// Accept connections on every bound socket until a shutdown signal
/// arrives, then wait for every in-flight connection to finish.
///
/// Each listener gets its own task that owns a [`JoinSet`] of the
/// connections it accepted; that task only returns once its own
/// connections have all finished, so awaiting every listener task here is
/// enough to guarantee every in-flight request completes before this
/// function returns.
async fn accept_loop(sockets: BoundSockets, shared: Arc<Shared>) {
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let mut listener_tasks = JoinSet::new();

    for listener in sockets.tcp {
        listener_tasks.spawn(run_tcp_listener(listener, Arc::clone(&shared), shutdown_rx.clone()));
    }
    for listener in sockets.unix {
        listener_tasks.spawn(run_unix_listener(listener, Arc::clone(&shared), shutdown_rx.clone()));
    }
    drop(shutdown_rx);

    wait_for_shutdown_signal().await;
    tracing::info!("shutdown signal received, closing listeners");
    let _ = shutdown_tx.send(());

    while listener_tasks.join_next().await.is_some() {}
    tracing::info!("all connections drained, exiting");
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("installing the SIGTERM handler cannot fail");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn run_tcp_listener(listener: TcpListener, shared: Arc<Shared>, mut shutdown_rx: watch::Receiver<()>) {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::debug!(%peer, "accepted tcp connection");
                    let shared = Arc::clone(&shared);
                    connections.spawn(async move { serve(stream, shared).await });
                }
                Err(error) => tracing::warn!(%error, "error accepting tcp connection"),
            },
        }
    }
    tracing::debug!(pending = connections.len(), "draining tcp connections");
    while connections.join_next().await.is_some() {}
}

async fn run_unix_listener(listener: UnixListener, shared: Arc<Shared>, mut shutdown_rx: watch::Receiver<()>) {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _peer)) => {
                    tracing::debug!("accepted unix connection");
                    let shared = Arc::clone(&shared);
                    connections.spawn(async move { serve(stream, shared).await });
                }
                Err(error) => tracing::warn!(%error, "error accepting unix connection"),
            },
        }
    }
    tracing::debug!(pending = connections.len(), "draining unix connections");
    while connections.join_next().await.is_some() {}
}
