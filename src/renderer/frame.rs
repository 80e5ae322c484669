//! Per-frame tessellation of the game state

use super::shapes::{CIRCLE_SEGMENTS, circle, polyline, rect};
use super::vertex::{Vertex, colors};
use crate::sim::{BodyId, GameMode, GameState, SceneHandles, Shape, StringTension};

/// String stroke width in pixels
pub const STRING_WIDTH: f32 = 4.0;

fn body_color(scene: &SceneHandles, id: BodyId) -> [f32; 4] {
    if id == scene.ball {
        colors::BALL
    } else if id == scene.handle {
        colors::HANDLE
    } else {
        match scene.mode() {
            GameMode::Cup => colors::CUP,
            GameMode::Spike => colors::SPIKE,
        }
    }
}

/// Triangle list for everything visible, in viewport pixels
pub fn build_frame(state: &GameState) -> Vec<Vertex> {
    let scene = state.scene();
    let mut vertices = Vec::with_capacity(512);

    for body in state.world().bodies().filter(|b| b.options.visible) {
        let color = body_color(scene, body.id);
        match body.shape {
            Shape::Rect { half_extents } => vertices.extend(rect(body.pos, half_extents, color)),
            Shape::Circle { radius } => {
                vertices.extend(circle(body.pos, radius, color, CIRCLE_SEGMENTS))
            }
        }
    }

    // String overlay goes on top
    if let Some(visual) = state.string_visual() {
        let color = match visual.tension {
            StringTension::Slack => colors::STRING_SLACK,
            StringTension::Taut => colors::STRING_TAUT,
        };
        vertices.extend(polyline(&visual.points(), STRING_WIDTH, color));
    }

    vertices
}
