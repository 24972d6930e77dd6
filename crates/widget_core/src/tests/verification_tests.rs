use super::*;

use base64::Engine as _;

#[derive(Debug, Default)]
struct FakeSurface {
    token_layout: Rect,
    target: Rect,
    override_origin: Option<Point>,
    dragging: bool,
    hover: bool,
    hidden_field: String,
    verified_shown: bool,
    error_visible: bool,
    scroll_requests: u32,
}

impl FakeSurface {
    /// Ball 40x40 at (20, 200); goal 100x60 at (300, 180).
    fn pitch() -> Self {
        Self {
            token_layout: Rect::new(20.0, 200.0, 40.0, 40.0),
            target: Rect::new(300.0, 180.0, 100.0, 60.0),
            ..Self::default()
        }
    }
}

impl GestureSurface for FakeSurface {
    fn token_rect(&self) -> Rect {
        match self.override_origin {
            Some(origin) => self.token_layout.moved_to(origin),
            None => self.token_layout,
        }
    }

    fn target_rect(&self) -> Rect {
        self.target
    }

    fn set_token_override(&mut self, origin: Option<Point>) {
        self.override_origin = origin;
    }

    fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    fn set_target_hover(&mut self, hover: bool) {
        self.hover = hover;
    }

    fn write_token(&mut self, token: &str) {
        self.hidden_field = token.to_string();
    }

    fn show_verified(&mut self) {
        self.verified_shown = true;
    }

    fn set_error_visible(&mut self, visible: bool) {
        self.error_visible = visible;
    }

    fn scroll_into_view(&mut self) {
        self.scroll_requests += 1;
    }
}

fn controller() -> VerificationController<FakeSurface> {
    VerificationController::new(FakeSurface::pitch())
}

// Ball center starts at (40, 220); a pointer delta of (310, 0) puts it at (350, 220).
const TOUCH_START: Point = Point::new(40.0, 220.0);
const INSIDE_GOAL: Point = Point::new(350.0, 220.0);
const SHORT_OF_GOAL: Point = Point::new(200.0, 220.0);

#[test]
fn release_outside_target_returns_to_idle_without_token() {
    let mut ctrl = controller();

    ctrl.begin_gesture(GestureStart::Touch(TOUCH_START));
    assert!(matches!(ctrl.state(), VerificationState::Dragging(_)));
    assert!(ctrl.surface().dragging);

    let outcome = ctrl.end_gesture(GestureEnd::Release(SHORT_OF_GOAL));
    assert_eq!(outcome, GestureOutcome::Reset);
    assert_eq!(ctrl.state(), &VerificationState::Idle);
    assert!(ctrl.surface().hidden_field.is_empty());
    assert_eq!(ctrl.surface().override_origin, None);
    assert!(!ctrl.surface().dragging);
    assert!(!ctrl.surface().hover);
}

#[test]
fn release_inside_target_verifies_once() {
    let mut ctrl = controller();

    ctrl.begin_gesture(GestureStart::Touch(TOUCH_START));
    let outcome = ctrl.end_gesture(GestureEnd::Release(INSIDE_GOAL));
    assert_eq!(outcome, GestureOutcome::Verified);

    let token = ctrl.token().cloned().expect("token");
    assert!(!token.as_str().is_empty());
    assert_eq!(ctrl.surface().hidden_field, token.as_str());
    assert!(ctrl.surface().verified_shown);
    assert_eq!(ctrl.surface().override_origin, None);

    assert_eq!(
        ctrl.end_gesture(GestureEnd::Release(INSIDE_GOAL)),
        GestureOutcome::Ignored
    );
    assert_eq!(
        ctrl.end_gesture(GestureEnd::Drop { on_target: true }),
        GestureOutcome::Ignored
    );
    assert_eq!(ctrl.token(), Some(&token));
    assert_eq!(ctrl.surface().hidden_field, token.as_str());
}

#[test]
fn begin_after_verification_is_ignored() {
    let mut ctrl = controller();
    ctrl.begin_gesture(GestureStart::Pointer);
    ctrl.end_gesture(GestureEnd::Drop { on_target: true });
    assert!(ctrl.is_verified());

    ctrl.begin_gesture(GestureStart::Touch(TOUCH_START));
    assert!(ctrl.is_verified());
    assert!(!ctrl.surface().dragging);
    assert_eq!(ctrl.surface().override_origin, None);
}

#[test]
fn touch_move_tracks_hover_from_cached_start() {
    let mut ctrl = controller();
    ctrl.begin_gesture(GestureStart::Touch(TOUCH_START));
    assert_eq!(
        ctrl.surface().override_origin,
        Some(Point::new(20.0, 200.0))
    );

    assert!(!ctrl.update_gesture_position(SHORT_OF_GOAL));
    assert!(!ctrl.surface().hover);
    assert_eq!(
        ctrl.surface().override_origin,
        Some(Point::new(180.0, 200.0))
    );

    assert!(ctrl.update_gesture_position(INSIDE_GOAL));
    assert!(ctrl.surface().hover);
    assert!(matches!(ctrl.state(), VerificationState::Dragging(_)));
}

#[test]
fn containment_is_inclusive_at_target_edge() {
    let mut ctrl = controller();
    ctrl.begin_gesture(GestureStart::Touch(TOUCH_START));
    // Center lands exactly on the goal's left edge (x = 300).
    let outcome = ctrl.end_gesture(GestureEnd::Release(Point::new(300.0, 220.0)));
    assert_eq!(outcome, GestureOutcome::Verified);
}

#[test]
fn hit_test_uses_target_rect_at_release_time() {
    let mut ctrl = controller();
    ctrl.begin_gesture(GestureStart::Touch(TOUCH_START));
    assert!(ctrl.update_gesture_position(INSIDE_GOAL));

    // The page scrolls during the drag and the goal moves away.
    ctrl.surface_mut().target = Rect::new(300.0, 480.0, 100.0, 60.0);

    let outcome = ctrl.end_gesture(GestureEnd::Release(INSIDE_GOAL));
    assert_eq!(outcome, GestureOutcome::Reset);
    assert!(ctrl.surface().hidden_field.is_empty());
}

#[test]
fn pointer_drag_relies_on_platform_drop() {
    let mut ctrl = controller();

    ctrl.begin_gesture(GestureStart::Pointer);
    ctrl.pointer_over_target(true);
    assert!(ctrl.surface().hover);
    ctrl.pointer_over_target(false);
    assert!(!ctrl.surface().hover);
    assert_eq!(
        ctrl.end_gesture(GestureEnd::Drop { on_target: false }),
        GestureOutcome::Reset
    );
    assert_eq!(ctrl.state(), &VerificationState::Idle);

    ctrl.begin_gesture(GestureStart::Pointer);
    assert_eq!(
        ctrl.end_gesture(GestureEnd::Drop { on_target: true }),
        GestureOutcome::Verified
    );
}

#[test]
fn update_without_touch_drag_is_a_no_op() {
    let mut ctrl = controller();
    assert!(!ctrl.update_gesture_position(INSIDE_GOAL));
    assert_eq!(ctrl.surface().override_origin, None);

    ctrl.begin_gesture(GestureStart::Pointer);
    assert!(!ctrl.update_gesture_position(INSIDE_GOAL));
    assert_eq!(ctrl.surface().override_origin, None);
}

#[test]
fn release_while_idle_is_ignored() {
    let mut ctrl = controller();
    assert_eq!(
        ctrl.end_gesture(GestureEnd::Release(INSIDE_GOAL)),
        GestureOutcome::Ignored
    );
    assert_eq!(ctrl.state(), &VerificationState::Idle);
}

#[test]
fn rapid_failed_attempts_leave_no_override() {
    let mut ctrl = controller();
    for x in [100.0, 150.0, 220.0] {
        ctrl.begin_gesture(GestureStart::Touch(TOUCH_START));
        ctrl.update_gesture_position(Point::new(x, 230.0));
        assert_eq!(
            ctrl.end_gesture(GestureEnd::Release(Point::new(x, 230.0))),
            GestureOutcome::Reset
        );
        assert_eq!(ctrl.state(), &VerificationState::Idle);
        assert_eq!(ctrl.surface().override_origin, None);
    }

    // A second touchstart before release restarts from the layout position.
    ctrl.begin_gesture(GestureStart::Touch(TOUCH_START));
    ctrl.update_gesture_position(SHORT_OF_GOAL);
    ctrl.begin_gesture(GestureStart::Touch(TOUCH_START));
    assert_eq!(
        ctrl.surface().override_origin,
        Some(Point::new(20.0, 200.0))
    );
}

#[test]
fn guard_submit_cancels_until_verified() {
    let mut ctrl = controller();

    assert_eq!(ctrl.guard_submit(), SubmitDecision::Cancel);
    assert!(ctrl.surface().error_visible);
    assert_eq!(ctrl.surface().scroll_requests, 1);

    ctrl.begin_gesture(GestureStart::Touch(TOUCH_START));
    assert_eq!(ctrl.guard_submit(), SubmitDecision::Cancel);
    ctrl.end_gesture(GestureEnd::Release(SHORT_OF_GOAL));
    assert_eq!(ctrl.guard_submit(), SubmitDecision::Cancel);
    assert_eq!(ctrl.surface().scroll_requests, 3);

    ctrl.begin_gesture(GestureStart::Touch(TOUCH_START));
    ctrl.end_gesture(GestureEnd::Release(INSIDE_GOAL));
    assert!(!ctrl.surface().error_visible);

    match ctrl.guard_submit() {
        SubmitDecision::Proceed { token } => {
            assert_eq!(token.as_str(), ctrl.surface().hidden_field)
        }
        SubmitDecision::Cancel => panic!("verified form must submit"),
    }
    assert_eq!(ctrl.surface().scroll_requests, 3);
}

#[test]
fn drag_miss_then_hit_then_submit() {
    let mut ctrl = controller();

    ctrl.begin_gesture(GestureStart::Touch(TOUCH_START));
    ctrl.update_gesture_position(Point::new(120.0, 260.0));
    ctrl.end_gesture(GestureEnd::Release(Point::new(120.0, 260.0)));
    assert_eq!(ctrl.state(), &VerificationState::Idle);

    ctrl.begin_gesture(GestureStart::Touch(TOUCH_START));
    ctrl.update_gesture_position(INSIDE_GOAL);
    ctrl.end_gesture(GestureEnd::Release(INSIDE_GOAL));
    assert!(ctrl.is_verified());
    assert!(!ctrl.surface().hidden_field.is_empty());
    assert!(matches!(ctrl.guard_submit(), SubmitDecision::Proceed { .. }));
}

#[test]
fn tokens_are_fresh_and_carry_goal_prefix() {
    let first = VerificationToken::generate();
    let second = VerificationToken::generate();
    assert_ne!(first, second);

    let decoded = STANDARD.decode(first.as_str()).expect("base64");
    let decoded = String::from_utf8(decoded).expect("utf8");
    let parts: Vec<&str> = decoded.split('_').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "goal");
    assert!(parts[1].parse::<i64>().is_ok());
    assert_eq!(parts[2].len(), TOKEN_RANDOM_LEN);
}
