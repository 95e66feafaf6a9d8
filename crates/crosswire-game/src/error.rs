//! Error types for the game layer.

/// Errors from board operations.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The target cell already holds a mark. Maps to the
    /// `INVL|24|That space is occupied.|` reply; the turn does not
    /// advance.
    #[error("cell ({0},{1}) is occupied")]
    SpaceOccupied(u8, u8),
}
