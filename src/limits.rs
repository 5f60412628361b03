//! Hard bounds on stored field sizes. Violations surface as validation
//! errors, never truncation.

pub const MAX_NAME_LEN: usize = 256;
pub const MAX_USERNAME_LEN: usize = 64;
pub const MAX_REALNAME_LEN: usize = 256;
pub const MAX_ASM_LEN: usize = 128;
pub const MAX_TITLE_LEN: usize = 256;
pub const MAX_DESCRIPTION_LEN: usize = 4096;

/// Minimum accepted password length, in bytes of UTF-8.
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 512;
