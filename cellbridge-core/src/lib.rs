//! Cellbridge core: content-addressed cell trees and their bag-of-cells encoding.
//!
//! Core concepts:
//! - **Cell**: An immutable node with up to 1023 payload bits and up to 4 children
//! - **CellHash**: A content hash uniquely identifying a cell
//! - **BagOfCells**: An arena of deduplicated cells with one designated root
//! - **boc**: The canonical byte encoding of a bag, plus its base64 text form
//! - **numeric**: Hex and fixed-width byte transcoding for big integers
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use cellbridge_core::{CellBuilder, boc};
//!
//! let mut builder = CellBuilder::new();
//! builder.store_uint(0xbeef, 16).unwrap();
//! let cell = Arc::new(builder.build().unwrap());
//!
//! let text = boc::to_base64(&cell).unwrap();
//! let back = boc::from_base64(&text).unwrap();
//! assert_eq!(back, cell);
//! ```

mod address;
mod bag;
pub mod boc;
mod builder;
mod cell;
mod error;
mod hash;
pub mod numeric;

pub use address::{AddressError, StdAddress};
pub use bag::{BagOfCells, CellId};
pub use boc::BocOptions;
pub use builder::CellBuilder;
pub use cell::{Cell, MAX_BITS, MAX_REFS};
pub use error::CellError;
pub use hash::CellHash;
pub use numeric::NumericError;
