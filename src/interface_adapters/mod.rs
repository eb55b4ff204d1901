// Interface adapters: wire protocol and network handling.

pub mod net;
pub mod protocol;

pub use net::{InboundDecoder, InboundStats, NetError, OutboundSink};
pub use protocol::{DecodeError, EncodeError, WireAction};
