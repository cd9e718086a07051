//! Identifier aliases shared between the IR, the lowering and the backend.

/// Name of a virtual register (`%N`), scoped to one function
pub type RegId = u32;

/// Stable identity of a block inside its function, independent of layout order
pub type BlockId = u32;

/// Number of a physical register class slot (`rN`, `aN`, `pN`)
pub type PhysId = u32;
