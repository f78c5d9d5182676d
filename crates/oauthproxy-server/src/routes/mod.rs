//! HTTP route handlers.

mod index;
mod proxy;

pub use index::{index, render_index};
pub use proxy::{auth_handler, not_found, token_handler};
