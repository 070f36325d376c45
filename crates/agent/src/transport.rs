use async_trait::async_trait;

/// Boundary to the external conversational voice service.
///
/// Implementations own signaling, audio, and retries; the session state
/// machine only issues these four calls and consumes the events the
/// implementation feeds back through its channel.
#[async_trait]
pub trait ConversationTransport: Send {
    /// Opens the session against the remote service.
    async fn connect(&mut self) -> anyhow::Result<()>;

    /// Pushes grounding text the remote agent should treat as system context.
    async fn send_context(&mut self, context: &str) -> anyhow::Result<()>;

    /// Sends a user-authored message into the conversation.
    async fn send_user_message(&mut self, text: &str) -> anyhow::Result<()>;

    /// Tears the session down. Must be safe to call on a dead session.
    async fn end(&mut self) -> anyhow::Result<()>;
}

/// Transport that accepts everything and records nothing. Used where a
/// session is driven without a live voice backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTransport;

#[async_trait]
impl ConversationTransport for NoopTransport {
    async fn connect(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn send_context(&mut self, _context: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn send_user_message(&mut self, _text: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn end(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
