/// Track state enumeration for object tracking lifecycle.
///
/// `Tentative → Confirmed ⇄ Lost`; removal is not a state, a removed track
/// is simply dropped from the live set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum TrackState {
    /// Newly created track, not yet reported
    #[default]
    Tentative,
    /// Matched at least `min_hits` times and matched in the current frame
    Confirmed,
    /// Confirmed track that missed its most recent frame(s)
    Lost,
}

impl TrackState {
    pub fn is_confirmed(self) -> bool {
        self == TrackState::Confirmed
    }
}
