//! Downstream compiler invocations.
//!
//! oxc for JavaScript and lightningcss for CSS, the only places the
//! pipeline hands content to a parser.

pub mod script;
pub mod style;
