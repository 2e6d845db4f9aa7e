// Register layout of the emulated PLIC. Offsets follow riscv-plic-1.0.0.

/// Upper bound on source slots plus one. Slot 0 is the fake source,
/// so source IDs range from 1 to 1022 (inclusive).
pub const PLIC_NUM_SOURCES: usize = 1024;

/// Upper bound on contexts whose enable and claim regions fit the window.
pub const PLIC_MAX_CONTEXTS: usize = 15872;

/// Size of the MMIO window, independent of the configured counts.
pub const PLIC_SIZE: usize = 0x400_0000;

/// Priorities are 3 bits wide.
pub const PLIC_PRIORITY_MASK: u32 = 0b111;

// --- Register Offsets (relative to the PLIC base) ---

/// Offset to priority register for interrupt source 0 (reserved).
/// Priority for source N is at: PLIC_PRIORITY_OFFSET + N * 4
pub const PLIC_PRIORITY_OFFSET: usize = 0x000000;

/// Offset to the first pending register word (bits 0–31).
/// Word index W covers sources [W*32, W*32+31].
pub const PLIC_PENDING_OFFSET: usize = 0x001000;

/// Offset to the enable bits for context 0.
/// For context C, enable region starts at: PLIC_ENABLE_OFFSET + C * PLIC_ENABLE_STRIDE
pub const PLIC_ENABLE_OFFSET: usize = 0x002000;

/// Stride between contexts in the enable region (in bytes).
/// Each context uses at most 32 words = 128 bytes = 0x80.
pub const PLIC_ENABLE_STRIDE: usize = 0x80;

/// Offset to the control registers (threshold & claim/complete) for context 0.
/// For context C, control region starts at: PLIC_CONTEXT_CTRL_OFFSET + C * PLIC_CONTEXT_STRIDE
pub const PLIC_CONTEXT_CTRL_OFFSET: usize = 0x200000;

/// Stride between contexts in the control region (in bytes).
pub const PLIC_CONTEXT_STRIDE: usize = 0x1000;

/// Offset within a context's control region to the claim/complete register.
/// The threshold register at offset 0 is left unbound.
pub const PLIC_CONTEXT_CLAIM_COMPLETE_OFFSET: usize = 0x04;

/// Width of one register in bytes.
pub const PLIC_REG_WIDTH: usize = 4;
