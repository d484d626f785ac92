//! Intent/locator tools.
//!
//! This module provides the forward, lookup and reverse directions of the store.

pub mod get;
pub mod set;
pub mod text;

pub use get::{LocatorGetParams, get_impl};
pub use set::{LocatorSetParams, set_impl};
pub use text::{LocatorTextParams, text_impl};
