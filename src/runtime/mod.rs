pub mod lifetime;

pub use lifetime::shutdown::listen_for_shutdown;
pub use lifetime::startup::{ShareLinkContext, prepare_startup};
