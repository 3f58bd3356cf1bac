//! Flint Vault: a single-file encrypted, compressed, password-protected
//! archive.
//!
//! The public surface is the operation set in [`ops`]: [`ops::create`],
//! [`ops::add`], [`ops::extract`], [`ops::list`], [`ops::remove`], and
//! [`ops::info`]. Everything else — command-line parsing, flag surfaces,
//! human-formatted listings, progress printers, password prompting — is an
//! external collaborator that calls this API, not part of this crate.

mod codec;
mod consts;
mod crypto;
mod format;
mod vault;

pub mod error;
pub mod model;
pub mod ops;
pub mod parallel;

pub use error::VaultError;
pub use model::{Directory, Entry, EntryMeta, Kind};
pub use ops::{
    add, create, extract, info, list, remove, AddOptions, AddReport, ContainerInfo, ExtractOptions,
    ExtractOutcome, ExtractReport, RemoveReport, Selector,
};
pub use parallel::{CancelFlag, ProgressFn};
