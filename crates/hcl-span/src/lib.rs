//! Source positions shared by the HCL and HIL parsers.
//!
//! Every token, AST node and error produced by `hcl-lexer`, `hcl-parser`
//! and `hil-parser` carries a [`Pos`]. Errors expose their (optional)
//! position through [`PositionedError`], which also knows how to render a
//! source excerpt pointing at the offending line and column.
//!
//! # Example
//!
//! ```
//! use hcl_span::Pos;
//!
//! let pos = Pos::new(3, 7, 42).with_filename("main.tf");
//! assert_eq!(pos.to_string(), "main.tf:3:7");
//! ```

pub mod diagnostic;
pub mod pos;

pub use diagnostic::{at, render, PositionedError};
pub use pos::Pos;
