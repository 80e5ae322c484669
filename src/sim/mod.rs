//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay host-independent:
//! - Driven only through `tick`
//! - Stable iteration order (by body/constraint id)
//! - No rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod detector;
pub mod motion;
pub mod scene;
pub mod sdf;
pub mod state;
pub mod string;
pub mod tick;
pub mod world;

pub use body::{Body, BodyId, BodyOptions, ConstraintId, Shape};
pub use detector::{PendingMagnet, PollOutcome};
pub use motion::{MotionSample, PointerEvent};
pub use scene::{SceneError, SceneHandles, Target, Viewport, build_scene};
pub use state::{GameEvent, GameMode, GamePhase, GameState};
pub use string::{StringTension, StringVisual};
pub use tick::{TickInput, tick};
pub use world::{DistanceConstraint, PhysicsWorld};
