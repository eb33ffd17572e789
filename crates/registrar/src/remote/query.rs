//! Paged, filtered list queries.

use super::wire::SEARCH_COLUMN;

/// One page of the list, optionally filtered by paternal surname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
    /// Trimmed, non-empty search term.
    pub search: Option<String>,
    /// Request one row past the page to learn whether another page exists.
    pub probe: bool,
}

impl ListQuery {
    /// Build a query. Pages below 1 become 1; blank search terms are dropped.
    #[must_use]
    pub fn new(page: u32, page_size: u32, search: Option<&str>) -> Self {
        let search = search
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_string);
        Self {
            page: page.max(1),
            page_size,
            search,
            probe: false,
        }
    }

    /// Ask for one extra row.
    #[must_use]
    pub fn with_probe(mut self, probe: bool) -> Self {
        self.probe = probe;
        self
    }

    /// Rows to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    /// Rows to request.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.page_size.saturating_add(u32::from(self.probe))
    }

    /// The store's filter expression, if searching.
    #[must_use]
    pub fn where_clause(&self) -> Option<String> {
        self.search
            .as_ref()
            .map(|term| format!("({SEARCH_COLUMN},like,%{term}%)"))
    }

    /// Query-string parameters for the list request.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("offset", self.offset().to_string()),
            ("limit", self.limit().to_string()),
        ];
        if let Some(clause) = self.where_clause() {
            params.push(("where", clause));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_without_search() {
        let query = ListQuery::new(1, 20, None);
        assert_eq!(query.offset(), 0);
        assert_eq!(query.limit(), 20);
        assert_eq!(query.where_clause(), None);
        assert_eq!(
            query.params(),
            vec![("offset", "0".to_string()), ("limit", "20".to_string())]
        );
    }

    #[test]
    fn test_offset_follows_page() {
        assert_eq!(ListQuery::new(2, 20, None).offset(), 20);
        assert_eq!(ListQuery::new(5, 10, None).offset(), 40);
    }

    #[test]
    fn test_page_zero_is_clamped() {
        let query = ListQuery::new(0, 20, None);
        assert_eq!(query.page, 1);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_search_builds_like_filter() {
        let query = ListQuery::new(1, 20, Some("  Gar "));
        assert_eq!(query.search.as_deref(), Some("Gar"));
        assert_eq!(
            query.where_clause().as_deref(),
            Some("(apellidoPaterno,like,%Gar%)")
        );
        assert_eq!(query.params().len(), 3);
    }

    #[test]
    fn test_blank_search_is_dropped() {
        assert_eq!(ListQuery::new(1, 20, Some("   ")).search, None);
        assert_eq!(ListQuery::new(1, 20, Some("")).where_clause(), None);
    }

    #[test]
    fn test_probe_adds_one_row_only_to_limit() {
        let query = ListQuery::new(2, 20, None).with_probe(true);
        assert_eq!(query.offset(), 20);
        assert_eq!(query.limit(), 21);
    }

    #[test]
    fn test_probe_limit_saturates() {
        let query = ListQuery::new(1, u32::MAX, None).with_probe(true);
        assert_eq!(query.limit(), u32::MAX);
    }
}
