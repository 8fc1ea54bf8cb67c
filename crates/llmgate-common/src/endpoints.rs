//! Endpoint identifiers the pipeline special-cases. The set is open: the
//! front-end may pass any provider operation name through unchanged.

pub const CHAT_COMPLETE: &str = "chatComplete";
pub const COMPLETE: &str = "complete";
pub const EMBED: &str = "embed";
pub const PROXY: &str = "proxy";
pub const UPLOAD_FILE: &str = "uploadFile";
