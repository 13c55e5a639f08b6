//! Line protocol spoken between a participant's terminal client and its
//! session.
//!
//! The protocol is deliberately plain text so a participant can type into
//! it directly:
//!
//! - **Commands** ([`ClientCommand`], [`parse_command`]): what a client
//!   sends, one per line (`"1 2"` or `"quit"`).
//! - **Messages** ([`ServerMessage`]): what a session sends back, each
//!   rendered through `Display` and terminated by a newline.
//! - **Errors** ([`ProtocolError`]): why a line was refused, with the
//!   exact reply the participant sees.
//!
//! # Architecture
//!
//! ```text
//! Transport (lines) → Protocol (ClientCommand / ServerMessage) → Session (turns)
//! ```
//!
//! Nothing here touches the arena's locks; the session decides when a
//! command is applied.

mod command;
mod error;
mod message;

pub use command::{ClientCommand, parse_command};
pub use error::ProtocolError;
pub use message::{ServerMessage, render_board};
