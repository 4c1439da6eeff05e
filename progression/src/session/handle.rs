use puzzle::HintKind;
use tokio::sync::{broadcast, mpsc, oneshot};

use super::commands::{LevelCommand, SessionError, SnapshotReply};
use super::events::LevelEvent;
use super::snapshot::LevelSnapshot;
use crate::rewards::AdOutcome;

/// Cheap, cloneable handle to a level session actor.
#[derive(Clone)]
pub struct LevelSessionHandle {
    id: String,
    cmd_tx: mpsc::Sender<LevelCommand>,
}

impl LevelSessionHandle {
    pub(crate) fn new(id: String, cmd_tx: mpsc::Sender<LevelCommand>) -> Self {
        Self { id, cmd_tx }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    async fn request(
        &self,
        build: impl FnOnce(SnapshotReply) -> LevelCommand,
    ) -> Result<LevelSnapshot, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))?
    }

    pub async fn select_tile(&self, tile: usize) -> Result<LevelSnapshot, SessionError> {
        self.request(|reply| LevelCommand::SelectTile { tile, reply })
            .await
    }

    pub async fn delete_last(&self) -> Result<LevelSnapshot, SessionError> {
        self.request(|reply| LevelCommand::DeleteLast { reply }).await
    }

    pub async fn clear_all(&self) -> Result<LevelSnapshot, SessionError> {
        self.request(|reply| LevelCommand::ClearAll { reply }).await
    }

    pub async fn use_hint(&self, kind: HintKind) -> Result<LevelSnapshot, SessionError> {
        self.request(|reply| LevelCommand::UseHint { kind, reply })
            .await
    }

    pub async fn pause(&self) -> Result<LevelSnapshot, SessionError> {
        self.request(|reply| LevelCommand::Pause { reply }).await
    }

    pub async fn resume(&self) -> Result<LevelSnapshot, SessionError> {
        self.request(|reply| LevelCommand::Resume { reply }).await
    }

    pub async fn restart(&self) -> Result<LevelSnapshot, SessionError> {
        self.request(|reply| LevelCommand::Restart { reply }).await
    }

    pub async fn refill_lives(&self) -> Result<LevelSnapshot, SessionError> {
        self.request(|reply| LevelCommand::RefillLives { reply })
            .await
    }

    pub async fn on_ad_result(&self, outcome: AdOutcome) -> Result<LevelSnapshot, SessionError> {
        self.request(|reply| LevelCommand::AdResult { outcome, reply })
            .await
    }

    pub async fn get_snapshot(&self) -> Result<LevelSnapshot, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(LevelCommand::GetSnapshot { reply: tx }).await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))
    }

    pub async fn subscribe(
        &self,
    ) -> Result<(LevelSnapshot, broadcast::Receiver<LevelEvent>), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(LevelCommand::Subscribe { reply: tx }).await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))
    }

    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(LevelCommand::Shutdown).await;
    }

    async fn send(&self, cmd: LevelCommand) -> Result<(), SessionError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| SessionError::Internal("Level session closed".into()))
    }
}
