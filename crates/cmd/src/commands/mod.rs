pub mod format;
pub mod init;
pub mod list;
pub mod mkdir;
pub mod mv;
pub mod preview;
pub mod query;
pub mod rm;
pub mod rmdir;
pub mod stat;
pub mod upload;

pub use format::{FormatEdit, format_set_command, format_show_command};
pub use init::init_command;
pub use list::list_command;
pub use mkdir::mkdir_command;
pub use mv::mv_command;
pub use preview::preview_command;
pub use query::query_command;
pub use rm::rm_command;
pub use rmdir::rmdir_command;
pub use stat::stat_command;
pub use upload::{UploadArgs, upload_command};
