//! Drag-to-goal human check that gates a form's submission.
//!
//! The visitor drags a token (the ball) onto a target region (the goal). Either
//! the platform drag API reports the drop, or touch moves are tracked here and
//! the release position is hit-tested against the target. Success writes an
//! opaque token into the form's hidden field. The token is a UX deterrent that
//! lets the form fail fast; the server decides whether to accept a submission.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use shared::domain::{Point, Rect};
use tracing::{debug, info};
use uuid::Uuid;

const TOKEN_PREFIX: &str = "goal";
const TOKEN_RANDOM_LEN: usize = 13;

/// Host-side access to the elements the gesture works with.
///
/// Rectangles are read at call time and must reflect scrolling, resizing and
/// any position override currently applied to the token.
pub trait GestureSurface {
    fn token_rect(&self) -> Rect;
    fn target_rect(&self) -> Rect;
    /// `Some(origin)` pins the token's top-left corner in viewport coordinates;
    /// `None` removes the override and returns it to its layout position.
    fn set_token_override(&mut self, origin: Option<Point>);
    fn set_dragging(&mut self, dragging: bool);
    fn set_target_hover(&mut self, hover: bool);
    /// Writes the hidden form field.
    fn write_token(&mut self, token: &str);
    fn show_verified(&mut self);
    fn set_error_visible(&mut self, visible: bool);
    fn scroll_into_view(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationToken(String);

impl VerificationToken {
    /// Base64 of `goal_<unix millis>_<random>`. Never decoded on the client.
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let random = Uuid::new_v4().simple().to_string();
        let raw = format!(
            "{TOKEN_PREFIX}_{millis}_{}",
            &random[..TOKEN_RANDOM_LEN]
        );
        Self(STANDARD.encode(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragAnchor {
    /// The platform drag API moves the token; only the drop is reported.
    Pointer,
    /// Touch tracking: pointer start and the token's rectangle at that moment.
    Touch { start: Point, token_start: Rect },
}

#[derive(Debug, Clone, PartialEq)]
pub enum VerificationState {
    Idle,
    Dragging(DragAnchor),
    Verified(VerificationToken),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureStart {
    Pointer,
    Touch(Point),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEnd {
    /// Touch released at the given position.
    Release(Point),
    /// Platform drag finished; `on_target` is true when it dropped on the goal.
    Drop { on_target: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Verified,
    Reset,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitDecision {
    Proceed { token: VerificationToken },
    Cancel,
}

pub struct VerificationController<S: GestureSurface> {
    surface: S,
    state: VerificationState,
}

impl<S: GestureSurface> VerificationController<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            state: VerificationState::Idle,
        }
    }

    pub fn state(&self) -> &VerificationState {
        &self.state
    }

    pub fn is_verified(&self) -> bool {
        matches!(self.state, VerificationState::Verified(_))
    }

    pub fn token(&self) -> Option<&VerificationToken> {
        match &self.state {
            VerificationState::Verified(token) => Some(token),
            _ => None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn begin_gesture(&mut self, start: GestureStart) {
        match self.state {
            VerificationState::Verified(_) => return,
            VerificationState::Dragging(_) => {
                debug!("gesture restarted before release");
                self.clear_drag_visuals();
            }
            VerificationState::Idle => {}
        }

        let anchor = match start {
            GestureStart::Pointer => DragAnchor::Pointer,
            GestureStart::Touch(point) => {
                let token_start = self.surface.token_rect();
                self.surface.set_token_override(Some(token_start.origin()));
                DragAnchor::Touch {
                    start: point,
                    token_start,
                }
            }
        };
        self.surface.set_dragging(true);
        self.state = VerificationState::Dragging(anchor);
        debug!(?anchor, "gesture started");
    }

    /// Follows a touch drag. Returns whether the token is currently over the target.
    pub fn update_gesture_position(&mut self, point: Point) -> bool {
        let VerificationState::Dragging(DragAnchor::Touch { start, token_start }) = self.state
        else {
            return false;
        };

        let moved = token_start.translated(point.delta_from(start));
        self.surface.set_token_override(Some(moved.origin()));
        let hover = self.surface.target_rect().contains(moved.center());
        self.surface.set_target_hover(hover);
        hover
    }

    /// Platform drag-over / drag-leave notifications.
    pub fn pointer_over_target(&mut self, over: bool) {
        if self.is_verified() {
            return;
        }
        self.surface.set_target_hover(over);
    }

    pub fn end_gesture(&mut self, end: GestureEnd) -> GestureOutcome {
        let anchor = match self.state {
            VerificationState::Dragging(anchor) => anchor,
            VerificationState::Idle | VerificationState::Verified(_) => {
                return GestureOutcome::Ignored
            }
        };

        let landed = match end {
            GestureEnd::Drop { on_target } => on_target,
            GestureEnd::Release(point) => {
                if matches!(anchor, DragAnchor::Touch { .. }) {
                    self.update_gesture_position(point);
                }
                // Both rectangles are re-read here; the cached start rect only
                // feeds the pointer delta.
                self.surface
                    .target_rect()
                    .contains(self.surface.token_rect().center())
            }
        };

        if landed {
            self.verify();
            GestureOutcome::Verified
        } else {
            self.clear_drag_visuals();
            self.state = VerificationState::Idle;
            debug!("gesture released outside target");
            GestureOutcome::Reset
        }
    }

    pub fn guard_submit(&mut self) -> SubmitDecision {
        match &self.state {
            VerificationState::Verified(token) => SubmitDecision::Proceed {
                token: token.clone(),
            },
            _ => {
                self.surface.set_error_visible(true);
                self.surface.scroll_into_view();
                SubmitDecision::Cancel
            }
        }
    }

    fn verify(&mut self) {
        let token = VerificationToken::generate();
        self.surface.write_token(token.as_str());
        self.surface.set_error_visible(false);
        self.clear_drag_visuals();
        self.surface.show_verified();
        self.state = VerificationState::Verified(token);
        info!("human verification completed");
    }

    fn clear_drag_visuals(&mut self) {
        self.surface.set_token_override(None);
        self.surface.set_target_hover(false);
        self.surface.set_dragging(false);
    }
}

#[cfg(test)]
#[path = "tests/verification_tests.rs"]
mod tests;
