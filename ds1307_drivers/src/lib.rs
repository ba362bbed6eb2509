#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod config;
pub mod hal;
pub mod host_clock;
pub mod rtc;
pub mod time_sync;
