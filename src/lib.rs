//! AD7705/AD7706 Rust Driver
//!
//! Driver for the Analog Devices AD7705 (two differential inputs) and AD7706
//! (three pseudo-differential inputs) 16-bit sigma-delta ADCs. No-std, with
//! optional async (`async`) and defmt (`defmt`) support and typed register access.
//!
//! The bus is any `embedded-hal` `SpiDevice` in [`bitbang::MODE`]; boards
//! without a hardware SPI peripheral can use [`bitbang::SoftSpi`].
//! Reads gated on the data-ready signal return [`Conversion`], which tells a
//! fresh result apart from a poll timeout.

#![no_std]

pub mod bitbang;
pub mod data_types;
pub mod driver;
pub mod error;
pub mod registers;

pub use data_types::{Channel, ChannelSetup, Conversion, PollTimeouts};
pub use driver::{Ad770x, NoPin};
pub use error::Error;
