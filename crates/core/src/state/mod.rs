#![allow(missing_docs)]

//! Observable view state and the primitives it is built from.

mod observable;
mod scope;
mod view;

pub use observable::Observable;
pub use view::{CatalogViewState, LoadStatus};
