/// Size in bytes of the stack region appended after the data blob in a fresh
/// memory image.
pub const STACK_SIZE: u32 = 4096;

/// Number of entries in the register file (`R0`-`R3`, `SP`, `DS`, `SS`,
/// `CS`, `ZF`, `CF`, `SF`, `PF`, `NUL`).
pub const REGISTER_COUNT: usize = 13;

/// High bit used to tag a value returned by `Malloc` as a heap handle
/// rather than an offset into the main memory image. See
/// [`crate::heap::Heap`].
pub const HEAP_TAG: u32 = 0x8000_0000;

/// Size of the address window reserved per heap allocation when encoding
/// handles. Generous relative to the toy programs this VM runs; keeps the
/// translate step a single shift-and-mask.
pub const HEAP_SLOT_BITS: u32 = 20;
