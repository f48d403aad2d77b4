//! Dispatch domain - session state and rendering contract

mod session;
mod view;

pub use session::{DispatchState, LastSearch, SearchSession};
pub use view::{FailureView, Renderer, ResultSource, SearchView};

#[cfg(test)]
pub use view::mock::RecordingRenderer;
