// Use cases layer: the action pipeline, its stages, and the store that drives them.

pub mod bombs;
pub mod bus;
pub mod keymap;
pub mod pipeline;
pub mod players;
pub mod shots;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use bus::bus_task;
pub use keymap::{Command, KeyMap, KeyMapError};
pub use pipeline::{Epic, Pipeline, RequestToNetwork, StateAccessor, build_pipeline};
pub use store::{DEFAULT_MAX_CASCADE, DispatchReport, Store};
pub use types::{Authority, BombIdPolicy, ParseSettingError, PipelineSettings};
