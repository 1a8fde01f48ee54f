/// Report titles the chat offers as selectable sources.
pub const KNOWN_DOCUMENTS: [&str; 12] = [
    "finnair",
    "yitgroup",
    "nokia",
    "tietoevry",
    "citycon",
    "743700G7A9J1PHM3X223-2022-12-31-FI",
    "srv",
    "fortum",
    "outokumpu",
    "qt",
    "nokianrenkaat",
    "uponor",
];

// Matches no document, so an empty selection retrieves nothing.
const NO_SOURCES_CLAUSE: &str = "title eq 'no sources provided'";

/// OData filter over document titles: an OR of equality clauses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievalFilter {
    expression: String,
}

impl RetrievalFilter {
    /// Builds the filter from the selected titles.
    ///
    /// An empty selection yields an unsatisfiable clause rather than an
    /// unfiltered search.
    pub fn from_titles<S: AsRef<str>>(titles: &[S]) -> Self {
        if titles.is_empty() {
            return Self::raw(NO_SOURCES_CLAUSE);
        }
        let expression = titles
            .iter()
            .map(|t| format!("title eq '{}'", t.as_ref().replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(" or ");
        Self { expression }
    }

    /// Wraps an expression built elsewhere, passed through verbatim.
    pub fn raw(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.expression
    }

    pub fn matches_nothing(&self) -> bool {
        self.expression == NO_SOURCES_CLAUSE
    }
}

impl std::fmt::Display for RetrievalFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_matches_nothing() {
        let filter = RetrievalFilter::from_titles::<&str>(&[]);
        assert_eq!(filter.as_str(), "title eq 'no sources provided'");
        assert!(filter.matches_nothing());
    }

    #[test]
    fn joins_titles_with_or() {
        let filter = RetrievalFilter::from_titles(&["finnair", "fortum"]);
        assert_eq!(filter.as_str(), "title eq 'finnair' or title eq 'fortum'");
        assert!(!filter.matches_nothing());

        let single = RetrievalFilter::from_titles(&["nokia".to_string()]);
        assert_eq!(single.as_str(), "title eq 'nokia'");
    }

    #[test]
    fn known_titles_carry_no_surrounding_whitespace() {
        for title in KNOWN_DOCUMENTS {
            assert_eq!(title, title.trim(), "{:?} is padded", title);
        }
        let filter = RetrievalFilter::from_titles(&["outokumpu"]);
        assert_eq!(filter.as_str(), "title eq 'outokumpu'");
    }

    #[test]
    fn quotes_inside_titles_are_doubled() {
        let filter = RetrievalFilter::from_titles(&["o'neil"]);
        assert_eq!(filter.as_str(), "title eq 'o''neil'");
    }
}
