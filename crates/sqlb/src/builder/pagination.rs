/// OFFSET / LIMIT pair applied with
/// [`SelectBuilder::pagination`](super::SelectBuilder::pagination).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    offset: u64,
    limit: u64,
}

impl Pagination {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Pagination for a 1-based page of `size` rows.
    ///
    /// # Panics
    ///
    /// Panics if `page` or `size` is less than 1, or if the offset of the
    /// page does not fit in a `u64`.
    pub fn from_page(page: u64, size: u64) -> Self {
        if page < 1 {
            panic!("page must be greater than 0");
        }
        if size < 1 {
            panic!("size must be greater than 0");
        }
        let Some(offset) = (page - 1).checked_mul(size) else {
            panic!("page {page} of size {size} overflows the row offset");
        };
        Self {
            offset,
            limit: size,
        }
    }

    pub fn set(&mut self, offset: u64, limit: u64) {
        self.offset = offset;
        self.limit = limit;
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}
