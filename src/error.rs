//! Unified error types for the IR blaster firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! bring-up path in `main` uniform.  All variants are `Copy` so they can be
//! passed around without allocation.
//!
//! None of these ever reach a trigger producer: HTTP clients and input lines
//! are fire-and-forget.  They surface in logs and in `main`'s bring-up.

use core::fmt;

use crate::adapters::wifi::ConnectivityError;
use crate::app::ports::{ConfigError, IrError, StorageError};
use crate::drivers::hw_init::HwInitError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible bring-up operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Persistent storage could not be read or written.
    Storage(StorageError),
    /// A communication subsystem failed.
    Comms(CommsError),
    /// The IR transmitter rejected a frame.
    Ir(IrError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Ir(e) => write!(f, "ir: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<IrError> for Error {
    fn from(e: IrError) -> Self {
        Self::Ir(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// The station did not associate within the startup window.
    WifiConnectTimeout,
    WifiConnectFailed,
    HttpServerFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnectTimeout => write!(f, "WiFi connect timed out"),
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::HttpServerFailed => write!(f, "HTTP server start failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

impl From<ConnectivityError> for CommsError {
    fn from(e: ConnectivityError) -> Self {
        match e {
            ConnectivityError::Timeout => Self::WifiConnectTimeout,
            _ => Self::WifiConnectFailed,
        }
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Comms(e.into())
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(match e {
            HwInitError::GpioConfigFailed(_) => "GPIO config failed",
            HwInitError::IsrInstallFailed(_) => "GPIO ISR service install failed",
            HwInitError::IsrAddFailed(_) => "GPIO ISR handler add failed",
        })
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
