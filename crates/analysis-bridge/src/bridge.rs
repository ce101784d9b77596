//! Asynchronous bridge to a UCI engine.
//!
//! The engine's pipes are owned by a background task. Callers talk to it over
//! a channel; requests that wait for an acknowledgment park on a one-shot
//! resolved by the task when the matching line arrives. One resolver is kept
//! per acknowledgment: a newer request replaces the older one, whose caller
//! gets `BridgeError::Superseded`.

use std::collections::HashMap;
use std::fmt;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command as ProcessCommand};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::evaluation::{AnalysisState, BridgePhase, Side};
use crate::uci::{EngineLine, UciCommand};

/// Called with the new state after every recorded report and completed search.
pub type Observer = Box<dyn Fn(&AnalysisState) + Send + Sync + 'static>;

type Reply = oneshot::Sender<Result<AnalysisState, BridgeError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Ack {
    ReadyOk,
    BestMove,
}

enum Command {
    Send(UciCommand),
    IsReady(Reply),
    Evaluate { fen: String, reply: Option<Reply> },
    Observe(Option<Observer>),
    Quit,
}

pub struct AnalysisBridge {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<AnalysisState>,
    task: JoinHandle<()>,
}

impl fmt::Debug for AnalysisBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisBridge")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl AnalysisBridge {
    /// Spawn the engine process from `config` and run the handshake.
    pub async fn spawn(config: &BridgeConfig) -> Result<Self, BridgeError> {
        if config.engine_path.trim().is_empty() {
            return Err(BridgeError::Config("engine path is empty"));
        }
        let mut child = ProcessCommand::new(&config.engine_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BridgeError::Spawn {
                path: config.engine_path.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(BridgeError::EngineExited)?;
        let stdout = child.stdout.take().ok_or(BridgeError::EngineExited)?;
        info!(path = %config.engine_path, "engine spawned");
        Self::start(stdout, stdin, config, Some(child)).await
    }

    /// Like [`spawn`](Self::spawn), but an engine that cannot be started means
    /// no analysis rather than an error.
    pub async fn try_spawn(config: &BridgeConfig) -> Option<Self> {
        match Self::spawn(config).await {
            Ok(bridge) => Some(bridge),
            Err(e) => {
                warn!(error = %e, "analysis unavailable");
                None
            }
        }
    }

    /// Run the bridge over any byte stream speaking UCI.
    pub async fn connect<R, W>(
        reader: R,
        writer: W,
        config: &BridgeConfig,
    ) -> Result<Self, BridgeError>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::start(reader, writer, config, None).await
    }

    async fn start<R, W>(
        reader: R,
        writer: W,
        config: &BridgeConfig,
        child: Option<Child>,
    ) -> Result<Self, BridgeError>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (commands, receiver) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(AnalysisState::new(config.multi_pv));
        let worker = Worker {
            writer,
            child,
            state: state_tx,
            pending: HashMap::new(),
            stale_searches: 0,
            side: Side::White,
            depth: config.depth,
            observer: None,
        };
        let task = tokio::spawn(worker.run(BufReader::new(reader), receiver));
        let bridge = Self {
            commands,
            state,
            task,
        };

        bridge.send(UciCommand::Uci)?;
        bridge.is_ready().await?;
        bridge.send(UciCommand::UciNewGame)?;
        bridge.is_ready().await?;
        if let Some(threads) = config.threads {
            bridge.send(UciCommand::set_option("Threads", threads))?;
        }
        if let Some(hash_mb) = config.hash_mb {
            bridge.send(UciCommand::set_option("Hash", hash_mb))?;
        }
        bridge.send(UciCommand::set_option("MultiPV", config.multi_pv))?;
        bridge.is_ready().await?;
        info!(depth = config.depth, multi_pv = config.multi_pv, "engine ready");

        Ok(bridge)
    }

    fn send(&self, command: UciCommand) -> Result<(), BridgeError> {
        self.commands
            .send(Command::Send(command))
            .map_err(|_| BridgeError::EngineExited)
    }

    async fn request(
        &self,
        command: Command,
        reply: oneshot::Receiver<Result<AnalysisState, BridgeError>>,
    ) -> Result<AnalysisState, BridgeError> {
        self.commands
            .send(command)
            .map_err(|_| BridgeError::EngineExited)?;
        reply.await.map_err(|_| BridgeError::Superseded)?
    }

    /// Round-trip `isready`.
    pub async fn is_ready(&self) -> Result<AnalysisState, BridgeError> {
        let (tx, rx) = oneshot::channel();
        self.request(Command::IsReady(tx), rx).await
    }

    /// Start analysing `fen` without waiting. Any search in progress is stopped
    /// and its waiter, if any, is superseded.
    pub fn submit(&self, fen: &str) {
        let command = Command::Evaluate {
            fen: fen.to_string(),
            reply: None,
        };
        if self.commands.send(command).is_err() {
            debug!("analysis bridge closed, position dropped");
        }
    }

    /// Analyse `fen` and wait for the search to complete.
    pub async fn evaluate(&self, fen: &str) -> Result<AnalysisState, BridgeError> {
        let (tx, rx) = oneshot::channel();
        let command = Command::Evaluate {
            fen: fen.to_string(),
            reply: Some(tx),
        };
        self.request(command, rx).await
    }

    /// Latest state snapshot.
    pub fn state(&self) -> AnalysisState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisState> {
        self.state.clone()
    }

    pub fn set_observer(&self, observer: impl Fn(&AnalysisState) + Send + Sync + 'static) {
        let _ = self.commands.send(Command::Observe(Some(Box::new(observer))));
    }

    pub fn clear_observer(&self) {
        let _ = self.commands.send(Command::Observe(None));
    }

    /// Send `quit` and wait for the background task to finish.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Quit);
        let _ = self.task.await;
    }
}

struct Worker<W> {
    writer: W,
    child: Option<Child>,
    state: watch::Sender<AnalysisState>,
    pending: HashMap<Ack, Reply>,
    /// Searches stopped but whose `bestmove` has not arrived yet.
    stale_searches: usize,
    side: Side,
    depth: u32,
    observer: Option<Observer>,
}

impl<W: AsyncWrite + Unpin> Worker<W> {
    async fn run<R>(mut self, reader: BufReader<R>, mut commands: mpsc::UnboundedReceiver<Command>)
    where
        R: AsyncRead + Unpin,
    {
        let mut lines = reader.lines();
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Quit) | None => {
                        let _ = self.write(&UciCommand::Quit).await;
                        break;
                    }
                    Some(command) => {
                        if let Err(e) = self.handle_command(command).await {
                            warn!(error = %e, "failed to write to engine");
                            break;
                        }
                    }
                },
                line = lines.next_line() => match line {
                    Ok(Some(line)) => self.handle_line(&line),
                    Ok(None) => {
                        warn!("engine closed its output");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read from engine");
                        break;
                    }
                },
            }
        }
        self.close();
    }

    async fn write(&mut self, command: &UciCommand) -> Result<(), BridgeError> {
        let cmd = command.to_string();
        debug!(cmd = %cmd, "engine <");
        self.writer.write_all(format!("{cmd}\n").as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn handle_command(&mut self, command: Command) -> Result<(), BridgeError> {
        match command {
            Command::Send(command) => self.write(&command).await,
            Command::IsReady(reply) => {
                self.pending.insert(Ack::ReadyOk, reply);
                self.write(&UciCommand::IsReady).await
            }
            Command::Evaluate { fen, reply } => {
                let searching = self.state.borrow().phase == BridgePhase::Searching;
                if searching {
                    self.stale_searches += 1;
                    self.write(&UciCommand::Stop).await?;
                }
                // Replacing or removing the old resolver supersedes its waiter.
                match reply {
                    Some(reply) => {
                        self.pending.insert(Ack::BestMove, reply);
                    }
                    None => {
                        self.pending.remove(&Ack::BestMove);
                    }
                }
                self.side = Side::from_fen(&fen);
                self.state.send_modify(|state| state.begin_search(&fen));
                self.notify();
                self.write(&UciCommand::Position { fen }).await?;
                self.write(&UciCommand::GoDepth(self.depth)).await
            }
            Command::Observe(observer) => {
                self.observer = observer;
                Ok(())
            }
            Command::Quit => Ok(()),
        }
    }

    fn handle_line(&mut self, line: &str) {
        debug!(line = line.trim(), "engine >");
        match EngineLine::parse(line) {
            EngineLine::ReadyOk => {
                self.state.send_if_modified(|state| {
                    let first = state.phase == BridgePhase::Uninitialized;
                    if first {
                        state.phase = BridgePhase::Ready;
                    }
                    first
                });
                if let Some(reply) = self.pending.remove(&Ack::ReadyOk) {
                    let _ = reply.send(Ok(self.state.borrow().clone()));
                }
            }
            EngineLine::Info(info) => {
                if self.stale_searches > 0 {
                    return;
                }
                let side = self.side;
                let recorded = self.state.send_if_modified(|state| {
                    state.phase == BridgePhase::Searching && state.record(&info, side)
                });
                if recorded {
                    self.notify();
                }
            }
            EngineLine::BestMove { best, ponder } => {
                if self.stale_searches > 0 {
                    self.stale_searches -= 1;
                    return;
                }
                self.state.send_modify(|state| {
                    state.phase = BridgePhase::Ready;
                    state.best_move = best;
                    state.ponder = ponder;
                });
                self.notify();
                if let Some(reply) = self.pending.remove(&Ack::BestMove) {
                    let _ = reply.send(Ok(self.state.borrow().clone()));
                }
            }
            EngineLine::UciOk | EngineLine::Other => {}
        }
    }

    fn notify(&self) {
        if let Some(observer) = &self.observer {
            let state = self.state.borrow().clone();
            observer(&state);
        }
    }

    fn close(&mut self) {
        self.state.send_modify(|state| state.phase = BridgePhase::Closed);
        for (_, reply) in self.pending.drain() {
            let _ = reply.send(Err(BridgeError::EngineExited));
        }
        if let Some(child) = self.child.as_mut() {
            // Best-effort kill; the engine has usually exited on `quit` already
            let _ = child.start_kill();
        }
        info!("analysis bridge closed");
    }
}
