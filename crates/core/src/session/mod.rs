//! # Session
//!
//! The conversational core: slot filling, the outer assistant loop, and
//! the execution bridge.
//!
//! ## Flow
//!
//! ```text
//! Assistant ──▶ SlotFillingSession ──complete──▶ SessionContext
//!     ▲               │ run/automate                  │
//!     └── next loop ──┴──────▶ ExecutionBridge ◀──────┘
//! ```

pub mod assistant;
pub mod console;
pub mod context;
pub mod events;
pub mod execution;
pub mod slot_filling;

pub use assistant::Assistant;
pub use console::{is_go_back, Console, ScriptedConsole, UserCommand};
pub use context::{CompletedTask, FinalRecord, SessionContext, UNKNOWN_TASK};
pub use events::{SessionEvent, SessionEventKind};
pub use execution::{ExecutionBridge, EXECUTION_PROMPT};
pub use slot_filling::{LoopOutcome, ReplyOutcome, SlotFillingSession, SlotPhase, SlotState};
