// Exit code registry (single source of truth)
// clap owns code 2 (usage errors)

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_IO_ERROR: u8 = 3;
