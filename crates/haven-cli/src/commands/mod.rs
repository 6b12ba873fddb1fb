pub mod capture;
pub mod common;
pub mod completions;
pub mod contacts;
pub mod queue;
pub mod reconcile;
pub mod sos;
pub mod status;
pub mod watch;
