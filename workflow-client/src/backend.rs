use async_trait::async_trait;
use shared::{Command, CommandReply, CommandStatus, Intent, ItemSnapshot, Timeline};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// Request/response surface of the service that owns item state.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get_item_state(&self, item_id: i64) -> ClientResult<ItemSnapshot>;

    async fn execute(&self, command: Command) -> ClientResult<CommandReply>;

    async fn get_timeline(&self, item_id: i64) -> ClientResult<Timeline>;
}

/// Wraps an intent in a fresh command and maps a failed reply to
/// [`ClientError::Rejected`].
pub async fn dispatch(backend: &dyn Backend, item_id: i64, intent: Intent) -> ClientResult<CommandReply> {
    let command = Command::new(item_id, intent);
    let name = command.intent.name();
    let command_id = command.id;
    debug!("Sending {} command {} for item {}", name, command_id, item_id);

    let reply = backend.execute(command).await?;
    match reply.status {
        CommandStatus::Success => Ok(reply),
        CommandStatus::Failed => {
            let message = reply
                .message
                .unwrap_or_else(|| format!("{} was rejected", name));
            warn!("Command {} ({}) rejected: {}", command_id, name, message);
            Err(ClientError::Rejected(message))
        }
    }
}
