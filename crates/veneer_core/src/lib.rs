//! Veneer Core Runtime
//!
//! Foundational primitives shared by the Veneer crates:
//!
//! - **Colors**: RGBA colors with hex parsing and CSS formatting
//! - **State Machines**: small typed transition tables with entry/exit actions
//! - **Scheduler**: cooperative, virtual-time timers and frame callbacks
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use veneer_core::scheduler::{ManualScheduler, Scheduler};
//!
//! let scheduler = ManualScheduler::new();
//! let timer = scheduler.schedule(Duration::from_millis(100), Box::new(|| {}));
//!
//! // A newer request supersedes the old one
//! scheduler.cancel(timer);
//! scheduler.schedule(Duration::from_millis(100), Box::new(|| {}));
//!
//! assert_eq!(scheduler.advance(Duration::from_millis(100)), 1);
//! ```

pub mod color;
pub mod fsm;
pub mod scheduler;

pub use color::{Color, ParseColorError};
pub use fsm::{StateMachine, Transition};
pub use scheduler::{FrameId, ManualScheduler, Scheduler, Task, TimerId};
