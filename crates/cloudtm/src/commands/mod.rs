pub mod apply;
pub mod destroy;
pub mod init;
pub mod list;
pub mod rollback;
