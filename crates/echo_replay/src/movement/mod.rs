//! Movement capture for the live actor and ghost playback for past turns.

pub mod player;
pub mod plugin;
pub mod sampler;

pub use player::PosePlayer;
pub use plugin::MovementPlugin;
pub use sampler::MovementSampler;
