pub mod controller;
pub mod destination;
pub mod events;
pub mod state;

pub use controller::{PrintController, PrintOutcome, PrintSession, PrintStatus};
pub use destination::SavePrompt;
pub use events::{EventSink, NullSink, PrintEvent};
pub use state::PrintState;
