//! Conversational client core for a persona chat bot.
//!
//! * [`transcript`]: ordered message log and its persistence slot.
//! * [`completion`]: chat-completions client and reply sanitizer.
//! * [`conversation`]: status machine and the controller tying it together.
//! * [`speech`]: speech-to-text input channel.
//! * [`config`]: settings and platform paths.

pub mod completion;
pub mod config;
pub mod conversation;
pub mod speech;
pub mod transcript;
