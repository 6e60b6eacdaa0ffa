// ---------------------------------------------------------------------------
// ReplayAnomaly: non-fatal problems met while recording or replaying
// ---------------------------------------------------------------------------

use std::fmt;

use crate::scene::{FireIndex, SceneObject};

/// A recorded event that could not be applied (or accepted).
///
/// Anomalies are logged and the affected event is skipped. They never
/// propagate out of `record_event` or `playback`; callers receive them inside
/// a `PlaybackReport` for inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayAnomaly {
    /// The scene index has no entry for this object.
    Missing(SceneObject),
    /// The object was indexed (or bound) but its entity no longer exists.
    Destroyed(SceneObject),
    /// No live fire matched the recorded index and none was close enough
    /// in health to be remapped.
    UnmatchedFire {
        fire: FireIndex,
        health: f32,
        available: Vec<FireIndex>,
    },
    /// A recording was handed an event from another task family.
    ForeignEvent {
        recording: &'static str,
        event: &'static str,
    },
    /// An event was appended with a timestamp earlier than the log's tail.
    OutOfOrder { timestamp: f32, previous: f32 },
}

impl fmt::Display for ReplayAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayAnomaly::Missing(object) => write!(f, "{object} not found in scene index"),
            ReplayAnomaly::Destroyed(object) => write!(f, "{object} was destroyed"),
            ReplayAnomaly::UnmatchedFire {
                fire,
                health,
                available,
            } => {
                let available = if available.is_empty() {
                    "<none>".to_string()
                } else {
                    available
                        .iter()
                        .map(|i| i.0.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                write!(
                    f,
                    "fire {} (health {health:.1}) has no live match; available indices: {available}",
                    fire.0
                )
            }
            ReplayAnomaly::ForeignEvent { recording, event } => {
                write!(f, "{recording} recording ignores {event} events")
            }
            ReplayAnomaly::OutOfOrder {
                timestamp,
                previous,
            } => write!(
                f,
                "event at {timestamp:.3}s appended after {previous:.3}s; log order kept as given"
            ),
        }
    }
}

impl std::error::Error for ReplayAnomaly {}

/// Outcome of one `playback` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackReport {
    /// Events applied to live objects.
    pub applied: usize,
    /// Events dropped, with the reason. Never retried.
    pub skipped: Vec<ReplayAnomaly>,
}

impl PlaybackReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn merge(&mut self, other: PlaybackReport) {
        self.applied += other.applied;
        self.skipped.extend(other.skipped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::LeverIndex;

    #[test]
    fn display_missing_lever() {
        let err = ReplayAnomaly::Missing(SceneObject::Lever(LeverIndex(3)));
        assert_eq!(err.to_string(), "lever 3 not found in scene index");
    }

    #[test]
    fn display_unmatched_fire_lists_available() {
        let err = ReplayAnomaly::UnmatchedFire {
            fire: FireIndex(5),
            health: 52.0,
            available: vec![FireIndex(0), FireIndex(2)],
        };
        let msg = err.to_string();
        assert!(msg.contains("fire 5"));
        assert!(msg.contains("0, 2"));
    }

    #[test]
    fn display_unmatched_fire_without_candidates() {
        let err = ReplayAnomaly::UnmatchedFire {
            fire: FireIndex(1),
            health: 10.0,
            available: Vec::new(),
        };
        assert!(err.to_string().contains("<none>"));
    }

    #[test]
    fn merge_accumulates() {
        let mut a = PlaybackReport {
            applied: 2,
            skipped: Vec::new(),
        };
        a.merge(PlaybackReport {
            applied: 1,
            skipped: vec![ReplayAnomaly::Destroyed(SceneObject::Lever(LeverIndex(0)))],
        });
        assert_eq!(a.applied, 3);
        assert!(!a.is_clean());
    }
}
