//! CLI command implementations.

mod check;
mod client_args;
mod request;
mod session;
mod storage;

pub(crate) use check::CheckArgs;
pub(crate) use request::RequestArgs;
pub(crate) use session::SessionCommand;
pub(crate) use storage::StorageCommand;
