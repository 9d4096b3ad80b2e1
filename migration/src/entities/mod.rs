pub mod share_link;
pub mod share_link_access_log;

pub use share_link::Entity as ShareLinkEntity;
pub use share_link_access_log::Entity as ShareLinkAccessLogEntity;
