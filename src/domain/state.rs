// Root client state: one slice per concern, each owned by its own reducer.

use crate::domain::action::Action;
use crate::domain::bombs::{self, BombsState};
use crate::domain::players::{self, PlayersState};
use crate::domain::session::{self, ConnectionState, SessionState};
use crate::domain::shots::{self, ShotsState};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameState {
    pub session: SessionState,
    pub connection: ConnectionState,
    pub players: PlayersState,
    pub bombs: BombsState,
    pub shots: ShotsState,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every slice reducer over `action`.
    ///
    /// Each reducer only sees its own slice, so slices untouched by the action keep
    /// their mapping references.
    pub fn reduce(&self, action: &Action) -> GameState {
        GameState {
            session: session::reduce(&self.session, action),
            connection: session::reduce_connection(&self.connection, action),
            players: players::reduce(&self.players, action),
            bombs: bombs::reduce(&self.bombs, action),
            shots: shots::reduce(&self.shots, action),
        }
    }
}
