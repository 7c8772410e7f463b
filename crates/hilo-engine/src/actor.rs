//! Tokio actor serializing every command through one task.
//!
//! The task owns the [`Engine`]; [`EngineHandle`] clones are mailboxes that
//! can be shared across any number of tasks. Commands are applied strictly
//! one at a time in arrival order, so no `place` can interleave with a
//! `resolve`.

use hilo_types::{AccountId, Credits, HiloError, Outcome, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::command::{Command, CommandOutput};
use crate::engine::Engine;
use crate::store::StateStore;

/// Default mailbox depth.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

struct Message {
    command: Command,
    response: oneshot::Sender<Result<CommandOutput>>,
}

/// Cloneable mailbox for a running engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<Message>,
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}

impl EngineHandle {
    /// Move `engine` into a new task. The task ends, handing the engine
    /// back, once every handle has been dropped.
    pub fn spawn<S>(engine: Engine<S>, capacity: usize) -> (Self, JoinHandle<Engine<S>>)
    where
        S: StateStore + Send + 'static,
    {
        let (sender, mut receiver) = mpsc::channel::<Message>(capacity.max(1));
        let task = tokio::spawn(async move {
            let mut engine = engine;
            while let Some(Message { command, response }) = receiver.recv().await {
                let kind = command.kind();
                let result = engine.execute(command);
                if response.send(result).is_err() {
                    tracing::debug!(command = kind, "Caller went away before the reply");
                }
            }
            tracing::info!("Engine mailbox closed");
            engine
        });
        (Self { sender }, task)
    }

    /// Submit `command` and wait for its result.
    ///
    /// # Errors
    /// The command's own error, or `Internal` if the engine task has stopped.
    pub async fn execute(&self, command: Command) -> Result<CommandOutput> {
        let (response, reply) = oneshot::channel();
        self.sender
            .send(Message { command, response })
            .await
            .map_err(|_| HiloError::Internal("engine task has stopped".to_string()))?;
        reply
            .await
            .map_err(|_| HiloError::Internal("engine task dropped the reply".to_string()))?
    }

    /// # Errors
    /// See [`execute`](Self::execute).
    pub async fn place(
        &self,
        account: impl Into<AccountId>,
        code: impl Into<String>,
        stake: Credits,
    ) -> Result<CommandOutput> {
        self.execute(Command::Place {
            account: account.into(),
            code: code.into(),
            stake,
        })
        .await
    }

    /// # Errors
    /// See [`execute`](Self::execute).
    pub async fn resolve(&self, outcome: Outcome) -> Result<CommandOutput> {
        self.execute(Command::Resolve { outcome }).await
    }

    /// # Errors
    /// See [`execute`](Self::execute).
    pub async fn balance(&self, account: impl Into<AccountId>) -> Result<Credits> {
        match self
            .execute(Command::QueryBalance {
                account: account.into(),
            })
            .await?
        {
            CommandOutput::Balance { balance, .. } => Ok(balance),
            other => Err(HiloError::Internal(format!(
                "unexpected reply to a balance query: {other:?}"
            ))),
        }
    }
}
