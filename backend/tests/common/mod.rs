// Not every utils is used in every test, so we allow dead code
#![allow(unused_imports, dead_code)]

mod fake_store;
pub use fake_store::*;
mod test_setup;
pub use test_setup::*;
mod utils;
pub use utils::*;
