use serde::{Deserialize, Serialize};

/// Query-string paging parameters: `?page=0&size=20&sortBy=createdAt&sortDir=asc`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(0).max(0)
    }

    pub fn size(&self) -> i64 {
        self.size.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        self.page() * self.size()
    }

    /// Builds an ORDER BY fragment from a whitelist of sortable columns.
    /// Anything outside the whitelist falls back to `default`, so the sort
    /// key is never interpolated from raw user input.
    pub fn order_clause(&self, allowed: &[(&str, &str)], default: &str) -> String {
        let column = self
            .sort_by
            .as_deref()
            .and_then(|requested| {
                allowed
                    .iter()
                    .find(|(name, _)| requested.eq_ignore_ascii_case(name))
                    .map(|(_, column)| *column)
            })
            .unwrap_or(default);
        let direction = match self.sort_dir.as_deref() {
            Some(dir) if dir.eq_ignore_ascii_case("asc") => "ASC",
            _ => "DESC",
        };
        format!("{} {}", column, direction)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, page: i64, size: i64, total_elements: i64) -> Self {
        let total_pages = if total_elements == 0 {
            0
        } else {
            (total_elements + size - 1) / size
        };
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(Page::new(vec![1], 0, 20, 0).total_pages, 0);
        assert_eq!(Page::new(vec![1], 0, 20, 1).total_pages, 1);
        assert_eq!(Page::new(vec![1], 0, 20, 20).total_pages, 1);
        assert_eq!(Page::new(vec![1], 0, 20, 21).total_pages, 2);
    }

    #[test]
    fn sort_column_is_whitelisted() {
        let allowed = [("createdAt", "created_at"), ("name", "name")];
        let mut params = PageParams {
            sort_by: Some("name".into()),
            sort_dir: Some("asc".into()),
            ..Default::default()
        };
        assert_eq!(params.order_clause(&allowed, "created_at"), "name ASC");

        params.sort_by = Some("1; DROP TABLE candidates".into());
        assert_eq!(
            params.order_clause(&allowed, "created_at"),
            "created_at ASC"
        );
    }
}
