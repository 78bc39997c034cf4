//! # Events Module
//!
//! Progress reporting decoupled from any particular UI.
//!
//! ## Design
//! Scanning, hashing and plan application emit events through a channel.
//! The CLI subscribes on a background thread and drives progress bars;
//! tests use [`null_sender`] and ignore them.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Hash(HashEvent::Progress(p)) = event {
//!             println!("Hashed {}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! let scan = detector.find_duplicates_with_events(&root, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
