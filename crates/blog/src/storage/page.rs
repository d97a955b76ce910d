//! Limit/offset pagination shared by every backend

/// A normalized page request
///
/// Callers pass signed values; a negative offset reads from the start and a
/// non-positive limit selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    /// Normalize a raw limit/offset pair. Returns `None` when the page is empty.
    pub fn new(limit: i64, offset: i64) -> Option<Self> {
        if limit <= 0 {
            return None;
        }
        Some(Self {
            limit: usize::try_from(limit).unwrap_or(usize::MAX),
            offset: usize::try_from(offset.max(0)).unwrap_or(usize::MAX),
        })
    }

    /// Apply this page to an already ordered sequence
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items.into_iter().skip(self.offset).take(self.limit).collect()
    }

    /// Limit and offset as SQL parameters
    pub(crate) fn sql_params(&self) -> (i64, i64) {
        (
            i64::try_from(self.limit).unwrap_or(i64::MAX),
            i64::try_from(self.offset).unwrap_or(i64::MAX),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_limit_is_empty() {
        assert_eq!(Page::new(0, 0), None);
        assert_eq!(Page::new(-5, 3), None);
    }

    #[test]
    fn test_negative_offset_clamps_to_zero() {
        assert_eq!(Page::new(10, -3), Some(Page { limit: 10, offset: 0 }));
    }

    #[test]
    fn test_slice() {
        let page = Page::new(2, 3).unwrap();
        assert_eq!(page.slice(0..10), vec![3, 4]);

        let past_end = Page::new(2, 10).unwrap();
        assert!(past_end.slice(0..10).is_empty());
    }
}
