//! Stack-facing commands over cells, config parameters and account state.
//!
//! A [`Bridge`] pops its operands from any [`OperandStack`], calls the
//! config codec or the account fetcher, and pushes the result back:
//!
//! | word              | alias    | effect                     |
//! |-------------------|----------|----------------------------|
//! | `cfg_boc_to_json` | `cfg>$j` | `( cell i -- $ )`          |
//! | `json_to_cfg_boc` | `$j>cfg` | `( $ i -- cell )`          |
//! | `fetch_account`   | `~>acc`  | `( wc addr url -- tuple )` |

mod bridge;
mod error;
mod stack;
mod value;

pub use bridge::{Bridge, Dictionary, Word};
pub use error::{BridgeError, ErrorKind};
pub use stack::{OperandStack, StackError, VecStack};
pub use value::{Atom, AtomTable, StackValue};
