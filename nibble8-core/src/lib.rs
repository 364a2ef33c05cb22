//! Core of a CHIP-8 style virtual machine: memory, registers, timers,
//! framebuffer, keypad latch and the fetch/decode/execute loop.
//!
//! Nothing in here knows about windows, terminals or sound devices. An
//! embedding loop drives [`Interpreter::cycle`] and
//! [`Interpreter::tick_timers`] and presents [`FrameBuffer`] however it likes.

mod error;
mod framebuffer;
mod input;
mod instruction;
mod interpreter;
pub mod memory;
mod timers;

pub use error::{FatalError, LoadError, MemoryError};
pub use framebuffer::{FrameBuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH};
pub use input::{InputLatch, KEY_COUNT};
pub use instruction::Instruction;
pub use interpreter::{Interpreter, Status, REGISTER_COUNT, STACK_SIZE};
pub use memory::{AddressSpace, Rom};
pub use timers::Timers;
