//! PostgREST query-string builder.

use std::fmt::Display;

use url::Url;

/// Sort direction for [`RestQuery::order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Direction {
    Asc,
    Desc,
}

impl Direction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Table path plus filter, ordering and embedding parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RestQuery {
    table: &'static str,
    params: Vec<(String, String)>,
}

impl RestQuery {
    pub(super) const fn table(table: &'static str) -> Self {
        Self {
            table,
            params: Vec::new(),
        }
    }

    /// Columns and embeds to return, e.g. `*,profiles(nickname)`.
    pub(super) fn select(self, columns: &str) -> Self {
        self.param("select", columns.to_owned())
    }

    pub(super) fn eq(self, column: &str, value: impl Display) -> Self {
        self.param(column, format!("eq.{value}"))
    }

    pub(super) fn in_list<I>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        let joined = values
            .into_iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.param(column, format!("in.({joined})"))
    }

    pub(super) fn is_null(self, column: &str) -> Self {
        self.param(column, "is.null".to_owned())
    }

    pub(super) fn order(self, column: &str, direction: Direction) -> Self {
        self.param("order", format!("{column}.{}", direction.as_str()))
    }

    pub(super) fn limit(self, limit: usize) -> Self {
        self.param("limit", limit.to_string())
    }

    /// Resolve against the project base URL (which must end in `/`).
    pub(super) fn url(&self, base: &Url) -> Result<Url, url::ParseError> {
        let mut url = base.join(&format!("rest/v1/{}", self.table))?;
        if !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.params);
        }
        Ok(url)
    }

    fn param(mut self, key: &str, value: String) -> Self {
        self.params.push((key.to_owned(), value));
        self
    }
}
