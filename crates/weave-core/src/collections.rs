//! Maps behind element props, host attribute tables, the flag verifier and
//! the abort sweep. The `std-hash` feature swaps `hashbrown` for `std`.

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::{HashMap, HashSet};
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use hashbrown::{HashMap, HashSet};
}
