//! Best-effort observation of control connection activity.
//!
//! Events are queued on an unbounded channel and delivered to observers from a
//! dedicated task, so a slow or panicking observer never stalls a session.

use log::{debug, info, warn};
use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    CommandReceived { command: String, remote: SocketAddr },
    ReplySent { code: u16, text: String, remote: SocketAddr },
    UserConnected { remote: SocketAddr },
    UserDisconnected { remote: SocketAddr },
}

pub trait FtpTraceObserver: Send + Sync {
    fn on_event(&self, event: &TraceEvent);
}

/// Forwards every event to the `log` facade.
#[derive(Debug, Default)]
pub struct LogTraceObserver;

impl FtpTraceObserver for LogTraceObserver {
    fn on_event(&self, event: &TraceEvent) {
        match event {
            TraceEvent::CommandReceived { command, remote } => {
                debug!("[{}] command {}", remote, command)
            }
            TraceEvent::ReplySent { code, text, remote } => {
                debug!("[{}] reply {} {}", remote, code, text)
            }
            TraceEvent::UserConnected { remote } => info!("[{}] connected", remote),
            TraceEvent::UserDisconnected { remote } => info!("[{}] disconnected", remote),
        }
    }
}

pub struct FtpTracer {
    sender: UnboundedSender<TraceEvent>,
    receiver: Mutex<Option<UnboundedReceiver<TraceEvent>>>,
    observers: Arc<Vec<Arc<dyn FtpTraceObserver>>>,
    connected_users: Arc<Mutex<Vec<SocketAddr>>>,
}

impl FtpTracer {
    pub fn new(observers: Vec<Arc<dyn FtpTraceObserver>>) -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
            observers: Arc::new(observers),
            connected_users: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Spawns the delivery task. Events traced before this call are kept and
    /// delivered once it runs. Calling it again does nothing.
    pub fn start(&self) {
        let receiver = match self.receiver.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        let Some(mut receiver) = receiver else {
            return;
        };
        let observers = Arc::clone(&self.observers);
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                for observer in observers.iter() {
                    if catch_unwind(AssertUnwindSafe(|| observer.on_event(&event))).is_err() {
                        warn!("Trace observer panicked on {:?}", event);
                    }
                }
            }
        });
    }

    pub fn trace_command(&self, command: &str, remote: SocketAddr) {
        self.emit(TraceEvent::CommandReceived {
            command: command.to_string(),
            remote,
        });
    }

    pub fn trace_reply(&self, code: u16, text: &str, remote: SocketAddr) {
        self.emit(TraceEvent::ReplySent {
            code,
            text: text.to_string(),
            remote,
        });
    }

    pub fn trace_user_connected(&self, remote: SocketAddr) {
        if let Ok(mut users) = self.connected_users.lock() {
            users.push(remote);
        }
        self.emit(TraceEvent::UserConnected { remote });
    }

    pub fn trace_user_disconnected(&self, remote: SocketAddr) {
        if let Ok(mut users) = self.connected_users.lock() {
            if let Some(index) = users.iter().position(|u| *u == remote) {
                users.remove(index);
            }
        }
        self.emit(TraceEvent::UserDisconnected { remote });
    }

    /// Snapshot of the peers with a live control connection.
    pub fn connected_users(&self) -> Vec<SocketAddr> {
        self.connected_users
            .lock()
            .map(|users| users.clone())
            .unwrap_or_default()
    }

    fn emit(&self, event: TraceEvent) {
        // A closed channel only means nobody listens anymore.
        let _ = self.sender.send(event);
    }
}

impl Default for FtpTracer {
    fn default() -> Self {
        Self::new(vec![Arc::new(LogTraceObserver)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    struct ChannelObserver(mpsc::UnboundedSender<TraceEvent>);

    impl FtpTraceObserver for ChannelObserver {
        fn on_event(&self, event: &TraceEvent) {
            let _ = self.0.send(event.clone());
        }
    }

    struct PanickingObserver;

    impl FtpTraceObserver for PanickingObserver {
        fn on_event(&self, _event: &TraceEvent) {
            panic!("observer failure");
        }
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_roster_tracks_connections() {
        let tracer = FtpTracer::new(Vec::new());
        tracer.trace_user_connected(addr(1000));
        tracer.trace_user_connected(addr(1001));
        assert_eq!(tracer.connected_users(), vec![addr(1000), addr(1001)]);
        tracer.trace_user_disconnected(addr(1000));
        assert_eq!(tracer.connected_users(), vec![addr(1001)]);
        tracer.trace_user_disconnected(addr(4242));
        assert_eq!(tracer.connected_users(), vec![addr(1001)]);
    }

    #[tokio::test]
    async fn test_events_reach_observers_in_order_despite_panics() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tracer = FtpTracer::new(vec![
            Arc::new(PanickingObserver),
            Arc::new(ChannelObserver(tx)),
        ]);
        tracer.trace_command("NOOP", addr(2000));
        tracer.start();
        tracer.trace_reply(200, "OK", addr(2000));

        assert_eq!(
            rx.recv().await,
            Some(TraceEvent::CommandReceived {
                command: "NOOP".into(),
                remote: addr(2000)
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(TraceEvent::ReplySent {
                code: 200,
                text: "OK".into(),
                remote: addr(2000)
            })
        );
    }
}
