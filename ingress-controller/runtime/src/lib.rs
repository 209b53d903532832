#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use autoingress_controller_core as core;
pub use autoingress_controller_k8s_api as k8s;
pub use autoingress_controller_k8s_store as store;
pub use autoingress_controller_sync as sync;

mod args;
mod index;

pub use self::args::Args;
