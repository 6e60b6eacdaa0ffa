//! Frame ordering for the replay engine.
//!
//! ```text
//! Clock  →  Bind  →  Capture  →  Playback
//! ```
//!
//! * **Clock** – advance the scene clock, apply restart requests.
//! * **Bind** – index newly spawned scene objects, configure actors, register
//!   and rebind task recordings. Commands issued here are flushed before
//!   `Capture`, so new components are visible downstream on the same frame.
//! * **Capture** – live actor sampling, live interaction capture, turn
//!   hand-off.
//! * **Playback** – task event replay and ghost poses. Runs last so replayed
//!   mutations are never seen by capture on the frame they happen.

use bevy::prelude::*;

/// Ordered phases of the replay engine in the `Update` schedule.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum EchoSet {
    Clock,
    Bind,
    Capture,
    Playback,
}

pub(crate) fn configure_echo_sets(app: &mut App) {
    app.configure_sets(
        Update,
        (
            EchoSet::Clock,
            EchoSet::Bind,
            EchoSet::Capture,
            EchoSet::Playback,
        )
            .chain(),
    );
}
