//! Dashboard controller: events in, commands out, one state tree.
//!
//! Architecture:
//! - `events`: the event/command vocabulary
//! - `state`: fetch slots, tabs, section config, poll state
//! - `reducer`: pure transition function
//! - `runtime`: executes commands, feeds completions back as events

pub mod events;
pub mod reducer;
pub mod runtime;
pub mod state;

pub use events::{Command, Event, FetchEvent, Generation, NavEvent, SysEvent, UiEvent};
pub use reducer::reduce;
pub use runtime::ControllerRuntime;
pub use state::{
    ControllerState, DashboardOptions, ExplanationTab, FetchSlot, PollState, ProfileTab,
    SectionConfig,
};
