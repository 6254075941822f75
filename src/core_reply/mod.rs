pub mod reply;

pub use reply::{format_multiline_reply, format_reply, quote_path, sanitize_reply_text, ReplyCode};
