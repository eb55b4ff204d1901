// Use-case level settings for assembling the action pipeline.

use crate::use_cases::keymap::KeyMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Where authoritative facts come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Authority {
    // Authoritative stages run in-process and answer every request.
    #[default]
    Local,
    // Only the server answers; requests are sent and facts arrive over the wire.
    Remote,
}

/// How bomb entity ids are derived from the placing player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BombIdPolicy {
    // Bomb id is the player id, so a second placement replaces the first.
    #[default]
    OnePerPlayer,
    // Every placement gets a fresh `{player_id}#{n}` id.
    Sequential,
}

#[derive(Debug)]
pub struct ParseSettingError {
    pub setting: &'static str,
    pub value: String,
}

impl fmt::Display for ParseSettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} `{}`", self.setting, self.value)
    }
}

impl FromStr for Authority {
    type Err = ParseSettingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Authority::Local),
            "remote" => Ok(Authority::Remote),
            _ => Err(ParseSettingError {
                setting: "authority",
                value: value.to_string(),
            }),
        }
    }
}

impl FromStr for BombIdPolicy {
    type Err = ParseSettingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "one_per_player" | "one-per-player" => Ok(BombIdPolicy::OnePerPlayer),
            "sequential" => Ok(BombIdPolicy::Sequential),
            _ => Err(ParseSettingError {
                setting: "bomb_policy",
                value: value.to_string(),
            }),
        }
    }
}

/// Shared configuration for building the action pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub authority: Authority,
    pub bomb_policy: BombIdPolicy,
    /// Distance covered by one accepted move request.
    pub move_step: f32,
    pub keymap: KeyMap,
    /// Game rule: minimum time between bomb placements by one player.
    pub reload_time: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            authority: Authority::Local,
            bomb_policy: BombIdPolicy::OnePerPlayer,
            move_step: 1.0,
            keymap: KeyMap::default(),
            reload_time: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_parsing_known_values_then_settings_match() {
        assert_eq!("Remote".parse::<Authority>().ok(), Some(Authority::Remote));
        assert_eq!(" local ".parse::<Authority>().ok(), Some(Authority::Local));
        assert_eq!(
            "sequential".parse::<BombIdPolicy>().ok(),
            Some(BombIdPolicy::Sequential)
        );
        assert_eq!(
            "one_per_player".parse::<BombIdPolicy>().ok(),
            Some(BombIdPolicy::OnePerPlayer)
        );
    }

    #[test]
    fn when_parsing_unknown_value_then_error_names_the_setting() {
        let err = "sometimes".parse::<BombIdPolicy>().unwrap_err();

        assert_eq!(err.setting, "bomb_policy");
        assert_eq!(err.value, "sometimes");
    }
}
