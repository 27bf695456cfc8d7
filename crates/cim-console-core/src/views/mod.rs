//! Resource view state.
//!
//! A view is what the console currently shows: the login form, the
//! dashboard, or a list/detail screen for one entity type. Views are plain
//! state; requests are started by the `Console`, which owns the view's
//! `ViewScope` and feeds results back in as `ViewEvent`s.

pub mod scope;
pub mod state;

pub use scope::ViewScope;
pub use state::{
    DetailView, Editable, Field, ListView, LoadedData, View, ViewEvent,
};
