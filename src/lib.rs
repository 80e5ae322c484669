//! Kendama - A motion-controlled cup-and-spike ball game
//!
//! Core modules:
//! - `sim`: Gameplay simulation (scene building, string control, landing detection)
//! - `renderer`: WebGPU rendering pipeline
//! - `platform`: Browser/native platform abstraction (motion sensing, haptics)
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences

pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matches the display refresh on most phones)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta fed into the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
}
