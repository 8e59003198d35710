//! Ports (trait boundaries) between the engine core and its collaborators.
//!
//! Searchers and the learned agent all implement [`MovePolicy`], which is the
//! only contract a GUI or evaluation harness needs. Training progress is
//! reported through [`TrainingObserver`].

pub mod observer;
pub mod policy;

pub use observer::TrainingObserver;
pub use policy::MovePolicy;
