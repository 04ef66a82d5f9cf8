pub mod asset;
pub mod email;
pub mod order;
pub mod print_order;

pub use asset::*;
pub use email::*;
pub use order::*;
pub use print_order::*;
