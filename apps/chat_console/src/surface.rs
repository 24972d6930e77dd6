//! Gesture surface that keeps element geometry in memory and logs visual changes.

use shared::domain::{Point, Rect};
use tracing::debug;
use widget_core::GestureSurface;

pub struct TerminalSurface {
    ball: Rect,
    goal: Rect,
    ball_override: Option<Point>,
    hidden_field: String,
}

impl TerminalSurface {
    /// A 40x40 ball at (20, 200) and a 100x60 goal at (300, 180).
    pub fn pitch() -> Self {
        Self {
            ball: Rect::new(20.0, 200.0, 40.0, 40.0),
            goal: Rect::new(300.0, 180.0, 100.0, 60.0),
            ball_override: None,
            hidden_field: String::new(),
        }
    }
}

impl GestureSurface for TerminalSurface {
    fn token_rect(&self) -> Rect {
        match self.ball_override {
            Some(origin) => self.ball.moved_to(origin),
            None => self.ball,
        }
    }

    fn target_rect(&self) -> Rect {
        self.goal
    }

    fn set_token_override(&mut self, origin: Option<Point>) {
        self.ball_override = origin;
    }

    fn set_dragging(&mut self, dragging: bool) {
        debug!(dragging, "ball");
    }

    fn set_target_hover(&mut self, hover: bool) {
        debug!(hover, "goal");
    }

    fn write_token(&mut self, token: &str) {
        self.hidden_field = token.to_string();
        debug!(len = self.hidden_field.len(), "human_verified set");
    }

    fn show_verified(&mut self) {
        println!("GOAL! verification complete");
    }

    fn set_error_visible(&mut self, visible: bool) {
        if visible {
            println!("error: please drag the football to the goal first");
        }
    }

    fn scroll_into_view(&mut self) {
        debug!("scroll verification into view");
    }
}
