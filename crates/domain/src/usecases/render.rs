//! Rendering use case - transforms a listing into a deliverable notification

use html_escape::encode_text;

use crate::model::{Listing, Notification};

/// Path of the upstream detail page, completed with the listing id
pub const DETAIL_PATH: &str = "/en/find-room/detail-accommodation/?detailId=";

/// Label of the inline button attached to every notification
pub const APPLY_LABEL: &str = "Apply";

/// Telegram's limit on visible photo caption characters
pub const MAX_CAPTION_CHARS: usize = 1024;

/// Visible characters of the caption outside the three fields
const CAPTION_LABEL_CHARS: usize = "\n\n\nTotal Price: ".len();

/// Configuration for the renderer
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Upstream site root, used for apply links and relative photo paths
    pub base_url: String,
    /// Maximum visible caption characters
    pub max_caption_chars: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://rooms.vestide.nl".to_string(),
            max_caption_chars: MAX_CAPTION_CHARS,
        }
    }
}

/// Renderer for transforming listings into notifications
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, listing: &Listing) -> Notification {
        Notification {
            listing_id: listing.id.clone(),
            caption: self.caption(listing),
            photo_url: self.photo_url(&listing.photo_uri),
            action_label: APPLY_LABEL.to_string(),
            action_url: self.apply_link(&listing.id),
        }
    }

    /// HTML caption: address in bold, title, then the total price
    ///
    /// Fields share what the label leaves of the limit: price first, then
    /// address, and the title gets the rest.
    pub fn caption(&self, listing: &Listing) -> String {
        let mut budget = self.config.max_caption_chars.saturating_sub(CAPTION_LABEL_CHARS);

        let rent = truncate_to_length(&listing.total_rent, budget);
        budget = budget.saturating_sub(rent.chars().count());
        let address = truncate_to_length(&listing.address, budget);
        budget = budget.saturating_sub(address.chars().count());
        let title = truncate_to_length(&listing.title, budget);

        format!(
            "<b>{}</b>\n{}\n\nTotal Price: <b>{}</b>",
            encode_text(&address),
            encode_text(&title),
            encode_text(&rent),
        )
    }

    /// Complete an upstream photo reference into an absolute URL
    pub fn photo_url(&self, photo_uri: &str) -> String {
        if photo_uri.starts_with("https://") || photo_uri.starts_with("http://") {
            return photo_uri.to_string();
        }
        if let Some(rest) = photo_uri.strip_prefix("//") {
            return format!("https://{}", rest);
        }
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            photo_uri.trim_start_matches('/')
        )
    }

    pub fn apply_link(&self, id: &str) -> String {
        format!(
            "{}{}{}",
            self.config.base_url.trim_end_matches('/'),
            DETAIL_PATH,
            id
        )
    }
}

/// Truncate to `max_len` characters, preferring a word boundary
fn truncate_to_length(content: &str, max_len: usize) -> String {
    if content.chars().count() <= max_len {
        return content.to_string();
    }
    if max_len <= 3 {
        return content.chars().take(max_len).collect();
    }

    // Leave room for "..."
    let keep = max_len.saturating_sub(3);
    let cut = content
        .char_indices()
        .nth(keep)
        .map_or(content.len(), |(idx, _)| idx);
    let head = &content[..cut];
    let break_point = head.rfind(char::is_whitespace).unwrap_or(head.len());

    format!("{}...", head[..break_point].trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_listing() -> Listing {
        Listing {
            id: "4411".to_string(),
            address: "Kruisstraat 12".to_string(),
            title: "Studio near campus".to_string(),
            total_rent: "€ 612,40".to_string(),
            photo_uri: "//rooms.vestide.nl/img/4411.jpg".to_string(),
        }
    }

    #[test]
    fn test_render_builds_full_notification() {
        let renderer = Renderer::new(RenderConfig::default());

        let result = renderer.render(&sample_listing());

        assert_eq!(result.listing_id, "4411");
        assert_eq!(
            result.caption,
            "<b>Kruisstraat 12</b>\nStudio near campus\n\nTotal Price: <b>€ 612,40</b>"
        );
        assert_eq!(result.photo_url, "https://rooms.vestide.nl/img/4411.jpg");
        assert_eq!(result.action_label, "Apply");
        assert_eq!(
            result.action_url,
            "https://rooms.vestide.nl/en/find-room/detail-accommodation/?detailId=4411"
        );
    }

    #[test]
    fn test_caption_escapes_html() {
        let renderer = Renderer::new(RenderConfig::default());
        let mut listing = sample_listing();
        listing.address = "Dorpsstraat 1 <A&B>".to_string();

        let caption = renderer.caption(&listing);

        assert!(caption.starts_with("<b>Dorpsstraat 1 &lt;A&amp;B&gt;</b>"));
    }

    #[test]
    fn test_photo_url_variants() {
        let renderer = Renderer::new(RenderConfig {
            base_url: "https://rooms.example.nl/".to_string(),
            ..Default::default()
        });

        assert_eq!(
            renderer.photo_url("//cdn.example.nl/a.jpg"),
            "https://cdn.example.nl/a.jpg"
        );
        assert_eq!(
            renderer.photo_url("http://cdn.example.nl/a.jpg"),
            "http://cdn.example.nl/a.jpg"
        );
        assert_eq!(
            renderer.photo_url("/img/a.jpg"),
            "https://rooms.example.nl/img/a.jpg"
        );
    }

    #[test]
    fn test_apply_link_trims_trailing_slash() {
        let renderer = Renderer::new(RenderConfig {
            base_url: "https://rooms.example.nl/".to_string(),
            ..Default::default()
        });

        assert_eq!(
            renderer.apply_link("77"),
            "https://rooms.example.nl/en/find-room/detail-accommodation/?detailId=77"
        );
    }

    #[test]
    fn test_long_title_is_truncated() {
        let renderer = Renderer::new(RenderConfig {
            max_caption_chars: 80,
            ..Default::default()
        });
        let mut listing = sample_listing();
        listing.title = "ruime kamer ".repeat(20);

        let caption = renderer.caption(&listing);
        let visible = caption.replace("<b>", "").replace("</b>", "");

        assert!(visible.chars().count() <= 80, "caption too long: {}", visible);
        assert!(caption.contains("..."));
        assert!(caption.ends_with("Total Price: <b>€ 612,40</b>"));
    }

    #[test]
    fn test_oversized_address_and_price_stay_within_limit() {
        let renderer = Renderer::new(RenderConfig::default());
        let mut listing = sample_listing();
        listing.address = "a".repeat(600);
        listing.title = "t".repeat(50);
        listing.total_rent = "r".repeat(600);

        let caption = renderer.caption(&listing);
        let visible = caption.replace("<b>", "").replace("</b>", "");

        assert!(
            visible.chars().count() <= MAX_CAPTION_CHARS,
            "caption has {} visible chars",
            visible.chars().count()
        );
        assert!(caption.ends_with(&format!("Total Price: <b>{}</b>", "r".repeat(600))));
        assert!(!caption.contains("tt"));
    }

    #[test]
    fn test_truncation_never_exceeds_tiny_limits() {
        assert_eq!(truncate_to_length("abcdef", 0), "");
        assert_eq!(truncate_to_length("abcdef", 2), "ab");
        assert_eq!(truncate_to_length("abcdef", 4), "a...");
        assert_eq!(truncate_to_length("abc", 3), "abc");
    }
}
