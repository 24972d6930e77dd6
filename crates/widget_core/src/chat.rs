use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{
    domain::ChatMessage,
    protocol::{AnswerQuery, GREETING_TOPIC},
    quick_reply::QuickReply,
};
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{
    answer_service::{AnswerOutcome, AnswerService, HttpAnswerService},
    config::WidgetSettings,
    error::ConfigError,
};

pub const FALLBACK_DECLINED: &str = "Sorry, I couldn't process your request. Please try again.";
pub const FALLBACK_UNREACHABLE: &str =
    "Sorry, I'm having trouble connecting. Please try again later.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRequest {
    /// Typed by the visitor; echoed into the transcript before the request.
    Text(String),
    /// Canned topic. `echo` is the button label shown as the visitor's message.
    Topic { key: String, echo: Option<String> },
}

impl QueryRequest {
    pub fn greeting() -> Self {
        Self::Topic {
            key: GREETING_TOPIC.to_string(),
            echo: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Opened,
    Closed,
    UnreadCleared,
    MessageAppended(ChatMessage),
    TypingStarted,
    TypingStopped,
}

/// How a `send_query` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTrip {
    /// Empty input; nothing was sent and the transcript is unchanged.
    Rejected,
    Answered,
    Declined,
    Unreachable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSnapshot {
    pub messages: Vec<ChatMessage>,
    pub pending: bool,
    pub open: bool,
    pub unread: bool,
    pub draft: String,
}

#[async_trait]
pub trait ChatHandle: Send + Sync {
    async fn toggle_open(&self);
    async fn open(&self);
    async fn close_widget(&self);
    async fn send_query(&self, request: QueryRequest) -> RoundTrip;
    async fn set_draft(&self, text: &str);
    async fn submit_draft(&self) -> RoundTrip;
    async fn quick_reply(&self, reply: &QuickReply) -> RoundTrip;
    async fn handle_key(&self, key: Key) -> Option<RoundTrip>;
    async fn snapshot(&self) -> ChatSnapshot;
    fn subscribe_events(&self) -> broadcast::Receiver<ChatEvent>;
}

struct ChatState {
    messages: Vec<ChatMessage>,
    pending: bool,
    open: bool,
    unread: bool,
    draft: String,
    /// Set on the first open, whether or not a greeting was owed.
    greeted: bool,
}

pub struct ChatController {
    answers: Arc<dyn AnswerService>,
    grace_delay: Duration,
    inner: Mutex<ChatState>,
    /// Held for a whole round trip so queued requests apply in submission order.
    lane: Mutex<()>,
    events: broadcast::Sender<ChatEvent>,
}

impl ChatController {
    pub fn new(answers: Arc<dyn AnswerService>, grace_delay: Duration) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            answers,
            grace_delay,
            inner: Mutex::new(ChatState {
                messages: Vec::new(),
                pending: false,
                open: false,
                unread: true,
                draft: String::new(),
                greeted: false,
            }),
            lane: Mutex::new(()),
            events,
        })
    }

    pub fn from_settings(settings: &WidgetSettings) -> Result<Arc<Self>, ConfigError> {
        let answers = HttpAnswerService::from_settings(settings)?;
        Ok(Self::new(Arc::new(answers), settings.grace_delay))
    }

    fn emit(&self, event: ChatEvent) {
        let _ = self.events.send(event);
    }

    /// Marks the panel open. Returns true when the greeting is still owed.
    fn mark_open(&self, state: &mut ChatState) -> bool {
        if !state.open {
            state.open = true;
            self.emit(ChatEvent::Opened);
        }
        if state.unread {
            state.unread = false;
            self.emit(ChatEvent::UnreadCleared);
        }
        let owed = state.messages.is_empty() && !state.greeted;
        state.greeted = true;
        owed
    }

    /// Takes the round-trip lane ahead of any later query while the first open
    /// is still undecided. Lock order is always `lane` then `inner`.
    async fn reserve_greeting_turn(&self) -> Option<MutexGuard<'_, ()>> {
        if self.inner.lock().await.greeted {
            return None;
        }
        Some(self.lane.lock().await)
    }

    async fn greet_if_owed(&self, owed: bool, turn: Option<MutexGuard<'_, ()>>) {
        if owed {
            debug!("first open; requesting greeting");
            self.run_round_trip(AnswerQuery::greeting(), None, turn).await;
        }
    }

    async fn run_round_trip(
        &self,
        query: AnswerQuery,
        echo: Option<String>,
        turn: Option<MutexGuard<'_, ()>>,
    ) -> RoundTrip {
        let _turn = match turn {
            Some(turn) => turn,
            None => self.lane.lock().await,
        };

        {
            let mut state = self.inner.lock().await;
            if let Some(echo) = echo {
                let message = ChatMessage::user(echo);
                state.messages.push(message.clone());
                self.emit(ChatEvent::MessageAppended(message));
            }
            state.pending = true;
            self.emit(ChatEvent::TypingStarted);
        }

        let (reply, outcome) = match self.answers.ask(&query).await {
            Ok(AnswerOutcome::Answered(message)) => (message, RoundTrip::Answered),
            Ok(AnswerOutcome::Declined) => (FALLBACK_DECLINED.to_string(), RoundTrip::Declined),
            Err(err) => {
                warn!(error = %err, "answer service unreachable");
                (FALLBACK_UNREACHABLE.to_string(), RoundTrip::Unreachable)
            }
        };

        if !self.grace_delay.is_zero() {
            tokio::time::sleep(self.grace_delay).await;
        }

        let mut state = self.inner.lock().await;
        state.pending = false;
        self.emit(ChatEvent::TypingStopped);
        let message = ChatMessage::assistant(reply);
        state.messages.push(message.clone());
        self.emit(ChatEvent::MessageAppended(message));
        debug!(?outcome, "round trip applied");
        outcome
    }
}

#[async_trait]
impl ChatHandle for ChatController {
    async fn toggle_open(&self) {
        let turn = self.reserve_greeting_turn().await;
        let owed = {
            let mut state = self.inner.lock().await;
            if state.open {
                state.open = false;
                self.emit(ChatEvent::Closed);
                return;
            }
            self.mark_open(&mut state)
        };
        self.greet_if_owed(owed, turn).await;
    }

    async fn open(&self) {
        let turn = self.reserve_greeting_turn().await;
        let owed = {
            let mut state = self.inner.lock().await;
            self.mark_open(&mut state)
        };
        self.greet_if_owed(owed, turn).await;
    }

    async fn close_widget(&self) {
        let mut state = self.inner.lock().await;
        if state.open {
            state.open = false;
            self.emit(ChatEvent::Closed);
        }
    }

    async fn send_query(&self, request: QueryRequest) -> RoundTrip {
        match request {
            QueryRequest::Text(text) => {
                if text.trim().is_empty() {
                    return RoundTrip::Rejected;
                }
                self.run_round_trip(AnswerQuery::Text(text.clone()), Some(text), None)
                    .await
            }
            QueryRequest::Topic { key, echo } => {
                self.run_round_trip(AnswerQuery::Topic(key), echo, None).await
            }
        }
    }

    async fn set_draft(&self, text: &str) {
        self.inner.lock().await.draft = text.to_string();
    }

    async fn submit_draft(&self) -> RoundTrip {
        let text = {
            let mut state = self.inner.lock().await;
            if state.draft.trim().is_empty() {
                return RoundTrip::Rejected;
            }
            std::mem::take(&mut state.draft)
        };
        self.send_query(QueryRequest::Text(text)).await
    }

    async fn quick_reply(&self, reply: &QuickReply) -> RoundTrip {
        self.send_query(QueryRequest::Topic {
            key: reply.topic.clone(),
            echo: Some(reply.label.clone()),
        })
        .await
    }

    async fn handle_key(&self, key: Key) -> Option<RoundTrip> {
        match key {
            Key::Enter => Some(self.submit_draft().await),
            Key::Escape => {
                self.close_widget().await;
                None
            }
        }
    }

    async fn snapshot(&self) -> ChatSnapshot {
        let state = self.inner.lock().await;
        ChatSnapshot {
            messages: state.messages.clone(),
            pending: state.pending,
            open: state.open,
            unread: state.unread,
            draft: state.draft.clone(),
        }
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/chat_tests.rs"]
mod tests;
