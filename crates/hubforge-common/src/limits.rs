//! Centralized limits for the layout builder.
//!
//! Type check ids are stored as unsigned 16-bit values in every type's slot
//! vector, so each slot can hold at most `SLOT_CAPACITY` distinct ids. Both the
//! class and the interface assigner derive their overflow handling from the
//! constants below.

// =============================================================================
// Type check slots
// =============================================================================

/// Number of distinct ids one type check slot can hold.
///
/// Ids are `u16`, and id 0 is reserved in every slot (for classes it is never
/// assigned, for interfaces it marks types that do not take part in the
/// slot), so a slot can number at most `SLOT_CAPACITY - 1` types.
pub const SLOT_CAPACITY: u32 = 1 << 16;

/// Smallest slot capacity accepted by `LayoutOptions`.
///
/// The class assigner needs room for at least one assigned id, one reserved
/// id and the unused id 0 before it can open an overflow slot.
pub const MIN_SLOT_CAPACITY: u32 = 4;

/// Id stored for a type that does not participate in a slot.
pub const UNASSIGNED_ID: u16 = 0;

// =============================================================================
// Recursion
// =============================================================================

/// Remaining stack (bytes) below which deep recursive walks grow the stack.
///
/// Used with `stacker::maybe_grow` by the class id and vtable passes, which
/// recurse once per level of the class hierarchy.
pub const STACK_RED_ZONE: usize = 64 * 1024;

/// Size of each stack segment allocated by `stacker::maybe_grow`.
pub const STACK_GROW_SIZE: usize = 1024 * 1024;
