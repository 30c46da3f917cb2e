pub mod models;

pub use models::{
    is_channel_id, is_id_char, Arguments, Credential, ItemKind, Operation, RemoteTool, ResultItem,
    Subscription, ToolCall, ToolResult, CHANNEL_ID_LEN, VIDEO_ID_LEN,
};

pub fn format_views(view_count: Option<u64>) -> String {
    match view_count {
        Some(count) if count > 1_000_000 => format!("{:.1}M views", count as f64 / 1_000_000.0),
        Some(count) => format!("{:.0}K views", count as f64 / 1_000.0),
        None => String::new(),
    }
}
