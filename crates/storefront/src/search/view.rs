//! Page view seam: what the search engine needs from the current page.
//!
//! The DOM belongs to the page bindings, not to the engine. The engine only
//! reads card text and menu hrefs, and requests highlight, scroll,
//! navigation, and notice side effects through this trait.

/// A rendered product card, in DOM order.
#[derive(Debug, Clone)]
pub struct ProductCard {
    /// Visible product name.
    pub name: String,
    /// Visible product description, empty when the card has none.
    pub description: String,
}

impl ProductCard {
    /// Create a card from its visible text.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Case-insensitive substring match against name and description.
    ///
    /// `needle` must already be lowercased.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

/// The current page, as seen by the search engine.
///
/// Implementations are expected to be cheap: `product_cards` is read once
/// per local match.
pub trait PageView: Send + Sync {
    /// Product cards currently rendered, in DOM order.
    fn product_cards(&self) -> Vec<ProductCard>;

    /// Hrefs of the navigation menu links, in declared order.
    fn menu_links(&self) -> Vec<String>;

    /// Remove any previous search highlight.
    fn clear_highlights(&self);

    /// Highlight the card at `index`.
    fn highlight(&self, index: usize);

    /// Scroll the card at `index` into view.
    fn scroll_into_view(&self, index: usize);

    /// Navigate to `url`, unloading the current page.
    fn navigate(&self, url: &str);

    /// Show a transient, self-dismissing notice.
    fn show_notice(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_matches_name_and_description() {
        let card = ProductCard::new("Camiseta Azul", "Algodón suave");
        assert!(card.matches("camiseta"));
        assert!(card.matches("azul"));
        assert!(card.matches("algodón"));
        assert!(!card.matches("gorra"));
    }
}
