pub mod ip;
pub mod token;

pub use ip::{is_private_or_local, parse_client_ip};
pub use token::{TOKEN_BYTES, generate_token};
