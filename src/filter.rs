use std::borrow::Cow;
use std::collections::HashSet;

use crate::feed::Article;

/// The active author selection restricting which articles are shown.
///
/// An empty selection means "no filter": every author is shown and the full
/// article set is borrowed as-is.
#[derive(Debug, Clone, Default)]
pub struct AuthorFilter {
    selected: HashSet<String>,
}

impl AuthorFilter {
    /// Flip an author in or out of the selection. Returns whether the author
    /// is selected afterwards.
    pub fn toggle(&mut self, author: &str) -> bool {
        if self.selected.remove(author) {
            false
        } else {
            self.selected.insert(author.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn contains(&self, author: &str) -> bool {
        self.selected.contains(author)
    }

    /// Derive the filtered view of the article set.
    ///
    /// The empty selection borrows the full set without copying; otherwise
    /// the result is the subsequence of matching articles in feed order.
    pub fn derive<'a>(&self, articles: &'a [Article]) -> Cow<'a, [Article]> {
        if self.selected.is_empty() {
            Cow::Borrowed(articles)
        } else {
            Cow::Owned(
                articles
                    .iter()
                    .filter(|a| self.selected.contains(&a.author))
                    .cloned()
                    .collect(),
            )
        }
    }

    /// The filter button label.
    pub fn label(&self) -> String {
        if self.selected.is_empty() {
            "filter by author (all)".to_string()
        } else {
            format!("{} authors selected", self.selected.len())
        }
    }
}

/// Distinct authors in first-seen feed order.
pub fn distinct_authors(articles: &[Article]) -> Vec<String> {
    let mut seen = HashSet::new();
    articles
        .iter()
        .filter(|a| seen.insert(a.author.clone()))
        .map(|a| a.author.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, author: &str) -> Article {
        Article {
            title: title.to_string(),
            link: format!("https://example.com/{title}"),
            author: author.to_string(),
            avatar: None,
            created: "2024-05-01T00:00:00".to_string(),
        }
    }

    fn sample() -> Vec<Article> {
        vec![
            article("a1", "Ann"),
            article("b1", "Bob"),
            article("a2", "Ann"),
            article("c1", "Cyd"),
            article("b2", "Bob"),
        ]
    }

    #[test]
    fn empty_filter_borrows_the_full_set() {
        let articles = sample();
        let filter = AuthorFilter::default();
        let view = filter.derive(&articles);
        assert_eq!(view.len(), 5);
        assert!(matches!(view, Cow::Borrowed(_)));
    }

    #[test]
    fn derive_is_an_order_preserving_subsequence() {
        let articles = sample();
        let mut filter = AuthorFilter::default();
        filter.toggle("Ann");
        filter.toggle("Cyd");

        let view = filter.derive(&articles);
        let titles: Vec<&str> = view.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["a1", "a2", "c1"]);
        assert!(view.iter().all(|a| filter.contains(&a.author)));
    }

    #[test]
    fn toggle_on_then_off_restores_the_view() {
        let articles = sample();
        let mut filter = AuthorFilter::default();
        filter.toggle("Bob");
        let before: Vec<_> = filter.derive(&articles).to_vec();

        assert!(filter.toggle("Ann"));
        assert!(!filter.toggle("Ann"));

        let after: Vec<_> = filter.derive(&articles).to_vec();
        assert_eq!(before, after);
    }

    #[test]
    fn selecting_every_author_still_filters_by_membership() {
        let articles = sample();
        let mut filter = AuthorFilter::default();
        for author in distinct_authors(&articles) {
            filter.toggle(&author);
        }
        let view = filter.derive(&articles);
        assert_eq!(view.len(), 5);
        assert!(matches!(view, Cow::Owned(_)));
    }

    #[test]
    fn distinct_authors_keep_first_seen_order() {
        let authors = distinct_authors(&sample());
        assert_eq!(authors, vec!["Ann", "Bob", "Cyd"]);
    }

    #[test]
    fn label_reflects_selection_count() {
        let mut filter = AuthorFilter::default();
        assert_eq!(filter.label(), "filter by author (all)");

        filter.toggle("Ann");
        assert_eq!(filter.label(), "1 authors selected");

        filter.toggle("Bob");
        assert_eq!(filter.label(), "2 authors selected");

        filter.clear();
        assert_eq!(filter.label(), "filter by author (all)");
    }
}
