mod cleanup;

pub use cleanup::{CleanupReport, ShareLinkCleanupTask};
