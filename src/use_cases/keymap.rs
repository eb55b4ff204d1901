// Key bindings and the stage that turns raw key presses into domain intents.

use crate::domain::selectors::is_signed_in;
use crate::domain::{Action, BombAction, Direction, PlayerAction, ShotAction};
use crate::use_cases::pipeline::{Epic, StateAccessor};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetBomb,
    DetonateBomb,
    FireShot,
    Move(Direction),
}

impl Command {
    pub fn to_action(self) -> Action {
        match self {
            Command::SetBomb => BombAction::SetKeyPressed.into(),
            Command::DetonateBomb => BombAction::DetonateKeyPressed.into(),
            Command::FireShot => ShotAction::FireKeyPressed.into(),
            Command::Move(direction) => PlayerAction::MoveKeyPressed { direction }.into(),
        }
    }
}

impl FromStr for Command {
    type Err = KeyMapError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let command = match value.trim() {
            "set_bomb" => Command::SetBomb,
            "detonate_bomb" => Command::DetonateBomb,
            "fire" => Command::FireShot,
            "move_up" => Command::Move(Direction::Up),
            "move_down" => Command::Move(Direction::Down),
            "move_left" => Command::Move(Direction::Left),
            "move_right" => Command::Move(Direction::Right),
            other => {
                return Err(KeyMapError::UnknownCommand(other.to_string()));
            }
        };
        Ok(command)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum KeyMapError {
    // Entry is not of the form `key=command`.
    MalformedEntry(String),
    UnknownCommand(String),
}

impl fmt::Display for KeyMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMapError::MalformedEntry(entry) => write!(f, "malformed key binding `{entry}`"),
            KeyMapError::UnknownCommand(command) => write!(f, "unknown command `{command}`"),
        }
    }
}

/// Key identifier to command table.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMap {
    bindings: HashMap<String, Command>,
}

impl Default for KeyMap {
    fn default() -> Self {
        KeyMap::empty()
            .bind("b", Command::SetBomb)
            .bind("n", Command::DetonateBomb)
            .bind(" ", Command::FireShot)
            .bind("ArrowUp", Command::Move(Direction::Up))
            .bind("ArrowDown", Command::Move(Direction::Down))
            .bind("ArrowLeft", Command::Move(Direction::Left))
            .bind("ArrowRight", Command::Move(Direction::Right))
            .bind("w", Command::Move(Direction::Up))
            .bind("s", Command::Move(Direction::Down))
            .bind("a", Command::Move(Direction::Left))
            .bind("d", Command::Move(Direction::Right))
    }
}

impl KeyMap {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn bind(mut self, key: impl Into<String>, command: Command) -> Self {
        self.bindings.insert(key.into(), command);
        self
    }

    pub fn command_for(&self, key: &str) -> Option<Command> {
        self.bindings.get(key).copied()
    }

    /// Parses `key=command` pairs separated by commas, e.g. `b=set_bomb,space=fire`.
    ///
    /// `space` names the space bar key.
    pub fn parse(bindings: &str) -> Result<KeyMap, KeyMapError> {
        let mut keymap = KeyMap::empty();
        for entry in bindings.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((key, command)) = entry.split_once('=') else {
                return Err(KeyMapError::MalformedEntry(entry.to_string()));
            };
            let key = match key.trim() {
                "" => return Err(KeyMapError::MalformedEntry(entry.to_string())),
                "space" => " ",
                key => key,
            };
            keymap = keymap.bind(key, command.parse()?);
        }
        Ok(keymap)
    }
}

/// `KEY_DOWN` → `*_KEY_PRESSED` for bound keys, only while signed in.
pub struct KeyDownToIntent {
    state: StateAccessor,
    keymap: KeyMap,
}

impl KeyDownToIntent {
    pub fn new(state: StateAccessor, keymap: KeyMap) -> Self {
        Self { state, keymap }
    }
}

impl Epic for KeyDownToIntent {
    fn name(&self) -> &'static str {
        "key_down_to_intent"
    }

    fn on_action(&mut self, action: &Action) -> Vec<Action> {
        let Action::KeyDown { key } = action else {
            return Vec::new();
        };
        let Some(command) = self.keymap.command_for(key) else {
            return Vec::new();
        };
        if !is_signed_in(&self.state.get()) {
            trace!(key = %key, "key ignored while signed out");
            return Vec::new();
        }
        vec![command.to_action()]
    }
}
