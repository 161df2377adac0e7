//! Helper functions shared by the renderer and template filters

mod html;
mod url;

pub use html::*;
pub use url::*;
