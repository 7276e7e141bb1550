//! CLI command implementations.
//!
//! | Module      | Commands handled                          |
//! |-------------|-------------------------------------------|
//! | `gate`      | `Status`, `Validate`, `Structure`, `Recover` |
//! | `hooks`     | `Hooks`                                   |
//! | `evolution` | `Evolution`                               |

pub mod evolution;
pub mod gate;
pub mod hooks;

pub use evolution::cmd_evolution;
pub use gate::{cmd_recover, cmd_status, cmd_structure, cmd_validate};
pub use hooks::cmd_hooks;
