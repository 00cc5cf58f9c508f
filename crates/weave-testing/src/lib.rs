//! Testing utilities and harness for Weave

pub mod testing;

// Re-export testing utilities
pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
    pub use weave_core::{component, Child, Element, Event, HookCx, Props};
}
