//! Preloader - pre-launch asset provisioning for a host application.
//!
//! Before the host scans for its own loadable units, the preloader downloads a
//! configured list of files (direct URLs, Modrinth or CurseForge), verifies
//! and installs them, and coordinates consent and failure decisions with a
//! detached helper process through two JSON files on disk.
//!
//! # Architecture
//!
//! ```text
//! Supervisor
//!     │
//!     ├── Coordinator (trait)
//!     │       ├── FileCoordinator ──► HelperHandle ──► helper process
//!     │       └── TerminalCoordinator (headless)
//!     │
//!     └── Orchestrator ──► TransferEngine
//!                               ├── EntryResolver ──► Modrinth / CurseForge
//!                               └── Downloader (HTTP, atomic replace)
//! ```
//!
//! The helper side of the protocol lives in [`helper`]; the rendering of its
//! window is supplied by the binary through [`helper::HelperView`].

pub mod config;
pub mod coordination;
pub mod helper;
pub mod logging;
pub mod orchestrator;
pub mod resolver;
pub mod supervisor;
pub mod transfer;

/// User agent sent with every outgoing HTTP request.
pub const USER_AGENT: &str = concat!("preloader/", env!("CARGO_PKG_VERSION"));
