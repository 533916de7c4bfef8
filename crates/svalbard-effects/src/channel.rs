//! Secondary channel handlers
//!
//! Neither handler puts message content into its errors.

mod console;
mod outbox;

pub use console::ConsoleChannel;
pub use outbox::{Delivery, OutboxChannel};
