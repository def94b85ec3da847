//! Channel: definitions, discovery, compilation, and runtime state for
//! one configured broadcast channel.

pub mod compiled;
pub mod definitions;
pub mod fingerprint;
pub mod pool;
pub mod program;
pub mod runtime;

pub use compiled::CompiledProgram;
pub use definitions::{ChannelDefinition, ChannelType};
pub use pool::{ChannelPool, SharedChannelPool};
pub use program::ChannelProgram;
pub use runtime::ChannelRuntime;
