//! Player handlers and the agent-side API.
//!
//! ## Strategies
//!
//! - `LocalPlayerHandler`: agent on a thread of this process
//! - `ProcessPlayerHandler`: agent behind a `Transport`, with a turn deadline
//!
//! Both pump the agent's command stream through a single-worker executor
//! into a `TurnHandle` the orchestrator waits on.

mod agent;
mod handler;
mod local;
mod process;
mod registry;
mod thread;

pub use agent::{AgentController, IdleBot, Player, PlayerKind, PlayerSpec, QueueItem};
pub use handler::{PlayerHandler, TurnHandle};
pub use local::LocalPlayerHandler;
pub use process::{ChannelTransport, InitPayload, ProcessLauncher, ProcessPlayerHandler, ThreadLauncher, Transport};
pub use registry::PlayerRegistry;
pub use thread::{CommandQueue, PlayerThread};
