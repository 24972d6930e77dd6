//! Headless controllers for the academy site's interactive widgets: the
//! drag-to-goal form verification and the chat assistant.
//!
//! Hosts render from the controllers' state and forward input events to them;
//! the controllers never touch a page directly.

pub mod answer_service;
pub mod chat;
pub mod config;
pub mod error;
pub mod verification;

pub use answer_service::{AnswerOutcome, AnswerService, HttpAnswerService};
pub use chat::{
    ChatController, ChatEvent, ChatHandle, ChatSnapshot, Key, QueryRequest, RoundTrip,
    FALLBACK_DECLINED, FALLBACK_UNREACHABLE,
};
pub use config::{load_settings, WidgetSettings};
pub use verification::{
    GestureEnd, GestureOutcome, GestureStart, GestureSurface, SubmitDecision,
    VerificationController, VerificationState, VerificationToken,
};
