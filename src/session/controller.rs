//! Session controller: the single owner of the conversation state.
//!
//! Receives user input (typed or transcribed), appends to the active
//! session, relays to the completion gateway, appends the reply, and
//! triggers speech synthesis. Every mutation is mirrored to durable
//! storage before the next suspension point, so a user message is
//! persisted before its gateway call is issued and the reply lands before
//! any synthesis starts. Downstream failures never surface as errors:
//! they degrade to fixed assistant messages in the log.

use super::store::{SessionCollection, StateStore};
use super::types::{Message, Session, SessionId};
use crate::gateway::{Completer, COMPLETION_ERROR_TEXT};
use crate::speech::{CaptureOutcome, SpeechPort};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fixed assistant farewell appended for the exit command.
pub const FAREWELL_TEXT: &str = "Exiting conversation. Goodbye!";

/// Token that ends the voice-interaction cycle (case-insensitive contains).
const EXIT_TOKEN: &str = "exit";

/// Maximum length of a generated conversation title.
const TITLE_MAX_CHARS: usize = 50;

/// What a call to `submit_user_input` did to the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty or whitespace-only input; no state change.
    Ignored,
    /// Exit command; only the farewell was appended, no gateway call.
    Farewell(String),
    /// Gateway reply appended.
    Replied(String),
    /// Gateway failed; the fixed fallback message was appended.
    Failed(String),
}

/// Orchestrates sessions, gateway calls, speech, and persistence.
pub struct SessionController<C: Completer> {
    gateway: C,
    speech: Box<dyn SpeechPort>,
    store: Arc<dyn StateStore>,
    collection: SessionCollection,
}

impl<C: Completer> SessionController<C> {
    /// Build a controller, reading prior state from the store.
    pub fn new(gateway: C, speech: Box<dyn SpeechPort>, store: Arc<dyn StateStore>) -> Self {
        let collection = store.load();
        info!(
            sessions = collection.len(),
            active = ?collection.active_id(),
            "Loaded conversation state"
        );
        Self {
            gateway,
            speech,
            store,
            collection,
        }
    }

    /// Create a new session and make it active. Always succeeds.
    pub fn create_session(
        &mut self,
        initial_message: Option<&str>,
        title: Option<&str>,
    ) -> SessionId {
        let id = self.collection.allocate_id();
        self.collection.insert(Session::new(id, initial_message, title));
        self.collection.select(id);
        self.persist();
        debug!(id, "Created session");
        id
    }

    /// Make `id` the active session. No-op if it does not exist.
    pub fn select_session(&mut self, id: SessionId) -> bool {
        let selected = self.collection.select(id);
        if selected {
            self.persist();
        }
        selected
    }

    /// Remove a session; stops any in-flight voice activity. Removing an
    /// absent id is a no-op.
    pub fn remove_session(&mut self, id: SessionId) {
        self.speech.stop_all();
        if self.collection.remove(id) {
            self.persist();
            debug!(id, "Removed session");
        }
    }

    /// Handle one round of user input.
    pub async fn submit_user_input(&mut self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }

        // Typing or a new transcript interrupts whatever is being spoken.
        self.speech.stop_all();

        let id = match self.collection.active_id() {
            Some(id) => {
                self.append(id, Message::user(text));
                id
            }
            None => {
                let id = self.collection.allocate_id();
                self.collection.insert(Session::new(id, Some(text), None));
                self.collection.select(id);
                id
            }
        };
        // The user message is durable before the gateway call goes out.
        self.persist();

        if text.to_lowercase().contains(EXIT_TOKEN) {
            self.append(id, Message::assistant(FAREWELL_TEXT));
            self.persist();
            return SubmitOutcome::Farewell(FAREWELL_TEXT.to_string());
        }

        match self.gateway.complete(text).await {
            Ok(reply) => {
                // Applied to the originating session even if the user has
                // since switched away; accepted staleness.
                self.append(id, Message::assistant(&reply));
                self.persist();
                if let Err(e) = self.speech.speak(&reply).await {
                    warn!(error = %e, "{}", e.user_message());
                }
                SubmitOutcome::Replied(reply)
            }
            Err(e) => {
                warn!(error = %e, "Gateway call failed");
                self.append(id, Message::assistant(COMPLETION_ERROR_TEXT));
                self.persist();
                SubmitOutcome::Failed(COMPLETION_ERROR_TEXT.to_string())
            }
        }
    }

    /// Toggle voice capture. Returns `None` when recording just started;
    /// when it stopped, the transcript is submitted as user input and the
    /// resulting outcome is returned.
    pub async fn toggle_voice_input(&mut self) -> crate::Result<Option<SubmitOutcome>> {
        match self.speech.toggle_capture().await? {
            CaptureOutcome::Started => Ok(None),
            CaptureOutcome::Stopped(transcript) => {
                Ok(Some(self.submit_user_input(&transcript).await))
            }
        }
    }

    /// Ask the gateway for a short conversation title, falling back to the
    /// truncated message on failure.
    pub async fn title_for(&self, message: &str) -> String {
        let prompt = format!(
            "Generate a short, concise title (max 4-5 words) for a conversation \
             that starts with: \"{}\"",
            message
        );
        match self.gateway.complete(&prompt).await {
            Ok(title) => title.chars().take(TITLE_MAX_CHARS).collect(),
            Err(e) => {
                warn!(error = %e, "Title generation failed, using fallback");
                let truncated: String = message.chars().take(30).collect();
                format!("{}...", truncated)
            }
        }
    }

    pub fn sessions(&self) -> &[Session] {
        self.collection.sessions()
    }

    pub fn active_id(&self) -> Option<SessionId> {
        self.collection.active_id()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.collection.active()
    }

    pub fn speech(&self) -> &dyn SpeechPort {
        self.speech.as_ref()
    }

    fn append(&mut self, id: SessionId, message: Message) {
        if let Some(session) = self.collection.get_mut(id) {
            session.push(message);
            session.refresh_preview();
        } else {
            warn!(id, "Dropping message for removed session");
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.collection) {
            // Persistence is a mirror, not a gate: the conversation
            // continues in memory.
            warn!(error = %e, "Failed to persist conversation state");
        }
    }
}
