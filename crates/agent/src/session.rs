//! Explicit state machine for a voice conversation.
//!
//! Transport callbacks (connect, disconnect, message, error) arrive at
//! unpredictable times and possibly more than once, so every transition is
//! guarded: duplicate events are no-ops and teardown is idempotent. The
//! machine itself is pure - [`VoiceSession::apply`] consumes one event and
//! returns the side effects to run - which keeps ordering races testable
//! without a live transport.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::transport::ConversationTransport;
use crate::ui_action::{extract_ui_action, strip_ui_actions, MenuPicker};

/// First user message pushed after connect so the agent speaks first.
const GREETING: &str = "Привет";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Connected,
    Ended,
    Failed,
}

/// Inbound events: user actions plus transport callbacks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    StartRequested,
    TransportConnected,
    AgentMessage(String),
    UserTranscript(String),
    TransportError(String),
    EndRequested,
    TransportDisconnected,
}

/// Side effects the caller must run against the transport or the UI.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionAction {
    Connect,
    SendContext(String),
    SendGreeting,
    OpenPicker(MenuPicker),
    EndTransport,
}

#[derive(Clone, Debug)]
pub struct VoiceSession {
    state: SessionState,
    context: String,
    context_sent: bool,
    greeting_sent: bool,
    agent_text: String,
    transcript: String,
    picker: Option<MenuPicker>,
    error: Option<String>,
}

impl VoiceSession {
    pub fn new(context: String) -> Self {
        Self {
            state: SessionState::Idle,
            context,
            context_sent: false,
            greeting_sent: false,
            agent_text: String::new(),
            transcript: String::new(),
            picker: None,
            error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Last agent reply with action blocks stripped out.
    pub fn agent_text(&self) -> &str {
        &self.agent_text
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn picker(&self) -> Option<&MenuPicker> {
        self.picker.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Consumes one event and returns the actions to execute. Events that do
    /// not fit the current state are dropped, never errors.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        match (self.state, event) {
            (
                SessionState::Idle | SessionState::Ended | SessionState::Failed,
                SessionEvent::StartRequested,
            ) => {
                self.state = SessionState::Connecting;
                self.context_sent = false;
                self.greeting_sent = false;
                self.picker = None;
                self.error = None;
                vec![SessionAction::Connect]
            }

            (SessionState::Connecting, SessionEvent::TransportConnected) => {
                self.state = SessionState::Connected;
                let mut actions = Vec::new();
                if !self.context_sent {
                    self.context_sent = true;
                    actions.push(SessionAction::SendContext(self.context.clone()));
                }
                if !self.greeting_sent {
                    self.greeting_sent = true;
                    actions.push(SessionAction::SendGreeting);
                }
                actions
            }

            (SessionState::Connected, SessionEvent::AgentMessage(text)) => {
                self.agent_text = strip_ui_actions(&text);
                let picker = extract_ui_action(&text)
                    .as_ref()
                    .and_then(MenuPicker::from_action);

                match picker {
                    Some(picker) => {
                        self.picker = Some(picker.clone());
                        // The conversation is done once a picker is on screen.
                        vec![SessionAction::OpenPicker(picker), SessionAction::EndTransport]
                    }
                    None => Vec::new(),
                }
            }

            (SessionState::Connected, SessionEvent::UserTranscript(text)) => {
                if !text.is_empty() {
                    self.transcript = text;
                }
                Vec::new()
            }

            (
                SessionState::Connecting | SessionState::Connected,
                SessionEvent::EndRequested,
            ) => {
                self.state = SessionState::Ended;
                vec![SessionAction::EndTransport]
            }

            (
                SessionState::Connecting | SessionState::Connected,
                SessionEvent::TransportDisconnected,
            ) => {
                self.state = SessionState::Ended;
                self.context_sent = false;
                self.greeting_sent = false;
                Vec::new()
            }

            (SessionState::Ended, SessionEvent::TransportError(_)) => Vec::new(),

            (_, SessionEvent::TransportError(message)) => {
                self.error = Some(message);
                self.state = SessionState::Failed;
                Vec::new()
            }

            (state, event) => {
                debug!(?state, ?event, "ignoring out-of-state session event");
                Vec::new()
            }
        }
    }
}

/// Runs a session to completion over a channel of inbound events, executing
/// each action against the transport. Transport failures are folded back into
/// the machine as error events rather than aborting the loop.
pub async fn drive_session<T>(
    mut transport: T,
    mut events: mpsc::Receiver<SessionEvent>,
    context: String,
) -> VoiceSession
where
    T: ConversationTransport,
{
    let mut session = VoiceSession::new(context);

    while let Some(event) = events.recv().await {
        let actions = session.apply(event);
        for action in actions {
            let outcome = match action {
                SessionAction::Connect => transport.connect().await,
                SessionAction::SendContext(context) => transport.send_context(&context).await,
                SessionAction::SendGreeting => transport.send_user_message(GREETING).await,
                SessionAction::OpenPicker(picker) => {
                    debug!(title = %picker.title, variants = picker.variants.len(), "picker ready");
                    Ok(())
                }
                SessionAction::EndTransport => transport.end().await,
            };

            if let Err(error) = outcome {
                warn!(%error, "voice transport call failed");
                session.apply(SessionEvent::TransportError(error.to_string()));
            }
        }

        if session.state() == SessionState::Ended {
            break;
        }
    }

    session
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    use crate::transport::ConversationTransport;

    use super::{drive_session, SessionAction, SessionEvent, SessionState, VoiceSession};

    const PICKER_REPLY: &str = r#"Подобрал варианты!
<UI_ACTION>
{"action": "OPEN_MENU_PICKER", "title": "Подбор меню", "variants": [{"name": "Вариант A", "items": [{"id": "h1", "name": "Классический кальян", "price": 7000}], "total": 7000}]}
</UI_ACTION>"#;

    fn connected_session() -> VoiceSession {
        let mut session = VoiceSession::new("контекст меню".to_string());
        session.apply(SessionEvent::StartRequested);
        session.apply(SessionEvent::TransportConnected);
        session
    }

    #[test]
    fn start_then_connect_sends_context_and_greeting_once() {
        let mut session = VoiceSession::new("контекст меню".to_string());

        let actions = session.apply(SessionEvent::StartRequested);
        assert_eq!(actions, vec![SessionAction::Connect]);
        assert_eq!(session.state(), SessionState::Connecting);

        let actions = session.apply(SessionEvent::TransportConnected);
        assert_eq!(
            actions,
            vec![
                SessionAction::SendContext("контекст меню".to_string()),
                SessionAction::SendGreeting
            ]
        );
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn duplicate_connect_callbacks_do_not_resend_context() {
        let mut session = connected_session();
        let actions = session.apply(SessionEvent::TransportConnected);
        assert!(actions.is_empty());
    }

    #[test]
    fn picker_reply_opens_the_modal_and_ends_the_call() {
        let mut session = connected_session();

        let actions = session.apply(SessionEvent::AgentMessage(PICKER_REPLY.to_string()));
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], SessionAction::OpenPicker(_)));
        assert_eq!(actions[1], SessionAction::EndTransport);

        let picker = session.picker().expect("picker stored");
        assert_eq!(picker.title, "Подбор меню");
        assert_eq!(session.agent_text(), "Подобрал варианты!");
    }

    #[test]
    fn plain_agent_text_is_recorded_without_actions() {
        let mut session = connected_session();
        let actions =
            session.apply(SessionEvent::AgentMessage("Что предпочитаете?".to_string()));
        assert!(actions.is_empty());
        assert_eq!(session.agent_text(), "Что предпочитаете?");
        assert!(session.picker().is_none());
    }

    #[test]
    fn teardown_is_idempotent() {
        let mut session = connected_session();

        let first = session.apply(SessionEvent::EndRequested);
        assert_eq!(first, vec![SessionAction::EndTransport]);
        assert_eq!(session.state(), SessionState::Ended);

        let second = session.apply(SessionEvent::EndRequested);
        assert!(second.is_empty());
        assert_eq!(session.state(), SessionState::Ended);

        let after_disconnect = session.apply(SessionEvent::TransportDisconnected);
        assert!(after_disconnect.is_empty());
        assert_eq!(session.state(), SessionState::Ended);
    }

    #[test]
    fn errors_after_teardown_are_ignored() {
        let mut session = connected_session();
        session.apply(SessionEvent::EndRequested);

        session.apply(SessionEvent::TransportError("socket closed".to_string()));
        assert_eq!(session.state(), SessionState::Ended);
        assert!(session.error().is_none());
    }

    #[test]
    fn transport_errors_fail_a_live_session() {
        let mut session = connected_session();
        session.apply(SessionEvent::TransportError("ws dropped".to_string()));
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.error(), Some("ws dropped"));
    }

    #[test]
    fn session_can_restart_after_ending() {
        let mut session = connected_session();
        session.apply(SessionEvent::EndRequested);

        let actions = session.apply(SessionEvent::StartRequested);
        assert_eq!(actions, vec![SessionAction::Connect]);

        let actions = session.apply(SessionEvent::TransportConnected);
        // Context and greeting go out again for the new call.
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn events_before_start_are_dropped() {
        let mut session = VoiceSession::new(String::new());
        assert!(session.apply(SessionEvent::AgentMessage("рано".to_string())).is_empty());
        assert!(session.apply(SessionEvent::TransportDisconnected).is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[derive(Clone, Default)]
    struct RecordingTransport {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingTransport {
        fn log(&self) -> Vec<String> {
            self.log.lock().expect("log lock").clone()
        }

        fn push(&self, entry: impl Into<String>) {
            self.log.lock().expect("log lock").push(entry.into());
        }
    }

    #[async_trait]
    impl ConversationTransport for RecordingTransport {
        async fn connect(&mut self) -> anyhow::Result<()> {
            self.push("connect");
            Ok(())
        }

        async fn send_context(&mut self, context: &str) -> anyhow::Result<()> {
            self.push(format!("context:{context}"));
            Ok(())
        }

        async fn send_user_message(&mut self, text: &str) -> anyhow::Result<()> {
            self.push(format!("user:{text}"));
            Ok(())
        }

        async fn end(&mut self) -> anyhow::Result<()> {
            self.push("end");
            Ok(())
        }
    }

    #[tokio::test]
    async fn drive_session_runs_a_full_conversation() {
        let transport = RecordingTransport::default();
        let log_handle = transport.clone();

        let (sender, receiver) = mpsc::channel(16);
        for event in [
            SessionEvent::StartRequested,
            SessionEvent::TransportConnected,
            SessionEvent::UserTranscript("нас трое".to_string()),
            SessionEvent::AgentMessage(PICKER_REPLY.to_string()),
            SessionEvent::TransportDisconnected,
        ] {
            sender.send(event).await.expect("send event");
        }
        drop(sender);

        let session = drive_session(transport, receiver, "меню".to_string()).await;

        assert_eq!(session.state(), SessionState::Ended);
        assert_eq!(session.transcript(), "нас трое");
        assert!(session.picker().is_some());
        assert_eq!(
            log_handle.log(),
            vec!["connect", "context:меню", "user:Привет", "end"]
        );
    }
}
