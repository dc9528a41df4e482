mod element;
#[macro_use]
mod formula;

pub use element::*;
pub use formula::*;
