use lesson_core::model::HtmlBody;

/// Forward-only cursor over a module's lessons or questions.
///
/// A walk is either not started, positioned on an item, or finished. Starting
/// positions outside the list clamp to the first item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walk<T> {
    items: Vec<T>,
    index: Option<usize>,
}

impl<T> Default for Walk<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: None,
        }
    }
}

impl<T: HtmlBody> Walk<T> {
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self { items, index: None }
    }

    /// Position on `start`, or on the first item when `start` is out of range.
    ///
    /// Returns the current item; `None` when there are no items.
    pub fn begin(&mut self, start: isize) -> Option<&T> {
        if self.items.is_empty() {
            self.index = None;
            return None;
        }
        let index = usize::try_from(start)
            .ok()
            .filter(|&i| i < self.items.len())
            .unwrap_or(0);
        self.index = Some(index);
        self.current()
    }

    /// Step forward. Past the last item the walk finishes and `None` is returned.
    ///
    /// A walk that is not positioned stays that way.
    pub fn advance(&mut self) -> Option<&T> {
        let next = self.index?.checked_add(1)?;
        if next < self.items.len() {
            self.index = Some(next);
        } else {
            self.index = None;
        }
        self.current()
    }

    /// Back to not started.
    pub fn reset(&mut self) {
        self.index = None;
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.index.is_some_and(|i| i + 1 < self.items.len())
    }

    #[must_use]
    pub fn current(&self) -> Option<&T> {
        self.index.and_then(|i| self.items.get(i))
    }

    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.index.is_some()
    }

    /// Raw HTML of the current item.
    #[must_use]
    pub fn current_body(&self) -> Option<&str> {
        self.current().map(HtmlBody::html_body)
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Swap in a fresh item list, keeping the position when it is still valid.
    pub fn replace_items(&mut self, items: Vec<T>) {
        self.items = items;
        if self.index.is_some_and(|i| i >= self.items.len()) {
            self.index = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Page(&'static str);

    impl HtmlBody for Page {
        fn html_body(&self) -> &str {
            self.0
        }
    }

    fn walk(n: usize) -> Walk<Page> {
        const BODIES: [&str; 4] = ["<p>0</p>", "<p>1</p>", "<p>2</p>", "<p>3</p>"];
        Walk::new(BODIES[..n].iter().map(|b| Page(*b)).collect())
    }

    #[test]
    fn n_advances_finish_exactly_once() {
        let mut w = walk(3);
        w.begin(0);
        assert!(w.advance().is_some());
        assert!(w.advance().is_some());
        assert!(w.is_active());
        assert!(w.advance().is_none());
        assert!(!w.is_active());
        assert!(!w.has_next());

        assert!(w.advance().is_none());
        assert!(w.current().is_none());
    }

    #[test]
    fn out_of_range_starts_clamp_to_zero() {
        let mut w = walk(3);
        let at_zero = w.begin(0).cloned();
        assert_eq!(w.begin(-5).cloned(), at_zero);
        assert_eq!(w.begin(3).cloned(), at_zero);
        assert_eq!(w.begin(isize::MAX).cloned(), at_zero);
        assert_eq!(w.begin(2).map(|p| p.0), Some("<p>2</p>"));
    }

    #[test]
    fn empty_walk_never_positions() {
        let mut w = walk(0);
        assert!(w.begin(0).is_none());
        assert!(!w.has_next());
        assert!(w.current_body().is_none());
    }

    #[test]
    fn has_next_is_false_on_the_last_item() {
        let mut w = walk(2);
        assert!(!w.has_next());
        w.begin(0);
        assert!(w.has_next());
        w.advance();
        assert!(!w.has_next());
        assert_eq!(w.current_body(), Some("<p>1</p>"));
    }

    #[test]
    fn replacing_items_drops_a_stale_position() {
        let mut w = walk(3);
        w.begin(2);
        w.replace_items(vec![Page("<p>only</p>")]);
        assert!(!w.is_active());
    }
}
