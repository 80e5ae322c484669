//! String controller
//!
//! The physical string is a single distance constraint. Real string only
//! pulls, so before every world step the constraint is switched between a
//! near-zero stiffness (slack, ball swings freely) and full stiffness (taut,
//! ball held on the circle of radius L). The same classification decides how
//! the string is drawn.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::scene::SceneHandles;
use super::world::PhysicsWorld;
use crate::tuning::Tuning;

/// Segments used to flatten the slack curve
pub const CURVE_SEGMENTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringTension {
    Slack,
    Taut,
}

/// Slack iff `distance < rest_length - margin`. No hysteresis: the state may
/// flip every step while the ball hovers around the threshold.
#[inline]
pub fn classify(distance: f32, rest_length: f32, margin: f32) -> StringTension {
    if distance < rest_length - margin {
        StringTension::Slack
    } else {
        StringTension::Taut
    }
}

/// Vertical droop of a slack string
#[inline]
pub fn sag(distance: f32, rest_length: f32, sag_factor: f32) -> f32 {
    ((rest_length - distance) * sag_factor).max(0.0)
}

/// What the renderer needs to draw the string this frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StringVisual {
    pub tension: StringTension,
    pub anchor: Vec2,
    pub ball: Vec2,
    /// Quadratic control point; the chord midpoint when taut
    pub control: Vec2,
}

impl StringVisual {
    pub fn new(anchor: Vec2, ball: Vec2, tuning: &Tuning) -> Self {
        let distance = anchor.distance(ball);
        let tension = classify(distance, tuning.string_rest_length, tuning.slack_margin);
        let mid = (anchor + ball) * 0.5;
        let control = match tension {
            StringTension::Slack => {
                mid + Vec2::new(
                    0.0,
                    sag(distance, tuning.string_rest_length, tuning.sag_factor),
                )
            }
            StringTension::Taut => mid,
        };
        Self {
            tension,
            anchor,
            ball,
            control,
        }
    }

    /// Polyline from anchor to ball: a flattened quadratic when slack, the
    /// bare segment when taut.
    pub fn points(&self) -> Vec<Vec2> {
        match self.tension {
            StringTension::Taut => vec![self.anchor, self.ball],
            StringTension::Slack => (0..=CURVE_SEGMENTS)
                .map(|i| {
                    let t = i as f32 / CURVE_SEGMENTS as f32;
                    let u = 1.0 - t;
                    self.anchor * (u * u) + self.control * (2.0 * u * t) + self.ball * (t * t)
                })
                .collect(),
        }
    }
}

/// String geometry for the current handle and ball positions.
///
/// Returns None if the scene's handle, ball or string is no longer in the
/// world.
pub fn current_visual(
    world: &PhysicsWorld,
    scene: &SceneHandles,
    tuning: &Tuning,
) -> Option<StringVisual> {
    let handle_pos = world.body(scene.handle)?.pos;
    let ball_pos = world.body(scene.ball)?.pos;
    let anchor = handle_pos + world.constraint(scene.string)?.point_a;
    Some(StringVisual::new(anchor, ball_pos, tuning))
}

/// Pre-step hook: reclassify the string and write stiffness and damping back
/// into the constraint. Returns the classification it acted on.
pub fn update_string(
    world: &mut PhysicsWorld,
    scene: &SceneHandles,
    tuning: &Tuning,
) -> Option<StringVisual> {
    let visual = current_visual(world, scene, tuning)?;
    let constraint = world.constraint_mut(scene.string)?;

    let (stiffness, damping) = match visual.tension {
        StringTension::Slack => (tuning.slack_stiffness, tuning.slack_damping),
        StringTension::Taut => (tuning.taut_stiffness, tuning.taut_damping),
    };
    constraint.stiffness = stiffness;
    constraint.damping = damping;

    Some(visual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::scene::{Viewport, build_scene};
    use crate::sim::state::GameMode;
    use proptest::prelude::*;

    fn setup() -> (PhysicsWorld, SceneHandles, Tuning) {
        let tuning = Tuning::default();
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 1.8), 1000.0);
        let scene = build_scene(&mut world, GameMode::Cup, Viewport::new(400.0, 800.0), &tuning)
            .expect("scene");
        (world, scene, tuning)
    }

    /// Put the ball `distance` straight above the anchor and run the hook
    fn stiffness_at(distance: f32) -> f32 {
        let (mut world, scene, tuning) = setup();
        let anchor = world.body(scene.handle).expect("handle").pos + tuning.string_anchor_offset;
        world.body_mut(scene.ball).expect("ball").pos = anchor - Vec2::new(0.0, distance);
        update_string(&mut world, &scene, &tuning).expect("visual");
        world.constraint(scene.string).expect("string").stiffness
    }

    #[test]
    fn test_switch_around_threshold() {
        let tuning = Tuning::default();
        let threshold = tuning.string_rest_length - tuning.slack_margin;

        assert_eq!(stiffness_at(threshold - 0.01), tuning.slack_stiffness);
        assert_eq!(stiffness_at(threshold), tuning.taut_stiffness);
        assert_eq!(stiffness_at(threshold + 0.01), tuning.taut_stiffness);
    }

    #[test]
    fn test_slack_and_taut_by_fraction_of_length() {
        let tuning = Tuning::default();
        let l = tuning.string_rest_length;
        assert_eq!(stiffness_at(0.5 * l), tuning.slack_stiffness);
        assert_eq!(stiffness_at(1.2 * l), tuning.taut_stiffness);
    }

    #[test]
    fn test_slack_curve_droops() {
        let tuning = Tuning::default();
        let anchor = Vec2::new(0.0, 0.0);
        let ball = Vec2::new(100.0, 0.0);
        let visual = StringVisual::new(anchor, ball, &tuning);

        assert_eq!(visual.tension, StringTension::Slack);
        // sag = (320 - 100) * 0.6
        assert!((visual.control.y - 132.0).abs() < 1e-3);

        let points = visual.points();
        assert_eq!(points.len(), CURVE_SEGMENTS + 1);
        assert_eq!(points[0], anchor);
        assert!((points[CURVE_SEGMENTS] - ball).length() < 1e-3);
        // Curve midpoint sits halfway to the control point
        assert!((points[CURVE_SEGMENTS / 2].y - 66.0).abs() < 1e-2);
    }

    #[test]
    fn test_taut_is_straight() {
        let tuning = Tuning::default();
        let visual = StringVisual::new(Vec2::ZERO, Vec2::new(0.0, 400.0), &tuning);
        assert_eq!(visual.tension, StringTension::Taut);
        assert_eq!(visual.points(), vec![Vec2::ZERO, Vec2::new(0.0, 400.0)]);
    }

    #[test]
    fn test_missing_ball_yields_no_visual() {
        let (mut world, scene, tuning) = setup();
        world.remove_body(scene.ball);
        assert!(update_string(&mut world, &scene, &tuning).is_none());
        assert!(current_visual(&world, &scene, &tuning).is_none());
    }

    #[test]
    fn test_current_visual_ends_at_ball() {
        let (mut world, scene, tuning) = setup();
        let ball_pos = Vec2::new(123.0, 456.0);
        world.body_mut(scene.ball).expect("ball").pos = ball_pos;
        let visual = current_visual(&world, &scene, &tuning).expect("visual");
        assert_eq!(visual.ball, ball_pos);
        let handle = world.body(scene.handle).expect("handle").pos;
        assert_eq!(visual.anchor, handle + tuning.string_anchor_offset);
    }

    proptest! {
        #[test]
        fn test_classification_matches_threshold(d in 0.0f32..1000.0) {
            let tuning = Tuning::default();
            let expected = if d < tuning.string_rest_length - tuning.slack_margin {
                StringTension::Slack
            } else {
                StringTension::Taut
            };
            prop_assert_eq!(
                classify(d, tuning.string_rest_length, tuning.slack_margin),
                expected
            );
        }

        #[test]
        fn test_sag_never_negative(d in 0.0f32..1000.0) {
            prop_assert!(sag(d, 320.0, 0.6) >= 0.0);
        }
    }
}
