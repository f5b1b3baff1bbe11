//! Telegram message rendering.

use chrono::{DateTime, Local};
use unicode_segmentation::UnicodeSegmentation;

use crate::models::Record;

/// Header line of every notification.
const HEADER: &str = "📢 <b>Nueva noticia en Séneca</b>";

/// Maximum number of body characters included in a message.
pub const BODY_LIMIT: usize = 500;

/// Marker appended when the body was cut at the limit.
pub const ELLIPSIS: &str = "...";

/// Render one record as a Telegram HTML message.
///
/// Header line, bold title, body capped at [`BODY_LIMIT`] grapheme
/// clusters, generation timestamp footer. Title and body are escaped so
/// Telegram's HTML parser treats scraped text as literal characters.
pub fn render_message(record: &Record, generated_at: DateTime<Local>) -> String {
    let (body, truncated) = truncate_graphemes(&record.body, BODY_LIMIT);
    let ellipsis = if truncated { ELLIPSIS } else { "" };

    format!(
        "{HEADER}\n\n<b>{}</b>\n\n{}{ellipsis}\n\n🕐 {}",
        escape_html(&record.title),
        escape_html(body),
        generated_at.format("%d/%m/%Y %H:%M"),
    )
}

/// Cut `text` after `limit` grapheme clusters, never splitting one.
fn truncate_graphemes(text: &str, limit: usize) -> (&str, bool) {
    match text.grapheme_indices(true).nth(limit) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

/// Escape the characters Telegram's HTML mode assigns meaning to.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
