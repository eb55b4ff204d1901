// Domain layer: action model, per-entity state slices and their reducers.

pub mod action;
pub mod bombs;
pub mod entity_map;
pub mod players;
pub mod ports;
pub mod selectors;
pub mod session;
pub mod shots;
pub mod state;

pub use action::{Action, EntityId, Origin, PlayerId};
pub use bombs::{Bomb, BombAction, BombsState};
pub use players::{Direction, Player, PlayerAction, PlayersState};
pub use ports::{ActionSink, SendError};
pub use session::{ConnectionEvent, ConnectionState, SessionAction, SessionState};
pub use shots::{Shot, ShotAction, ShotsState};
pub use state::GameState;
