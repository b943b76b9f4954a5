pub mod background;
pub mod bundle;
pub mod config;
pub mod coordinator;
pub mod evaluator;
pub mod fetcher;
pub mod orchestrator;
pub mod panel;
pub mod scripts;
pub mod snapshot;
pub mod transport;

pub use domgrab_core::error;
pub use domgrab_core::identity;
pub use domgrab_core::listener;
pub use domgrab_core::protocol;
pub use domgrab_core::selector;
