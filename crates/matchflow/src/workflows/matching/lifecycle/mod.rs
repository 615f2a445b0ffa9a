//! Application lifecycle: a total transition function over [`ApplicationState`].
//!
//! The machine never touches storage. Callers evaluate guards, ask [`transition`]
//! for the next state and effects, and persist only when it returns `Ok`.

mod machine;
mod state;

pub use machine::{
    transition, GuardResult, LifecycleEffect, LifecycleError, LifecycleEvent, Transition,
};
pub use state::{ApplicationState, StatusReason};
