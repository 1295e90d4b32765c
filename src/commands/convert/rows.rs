use std::iter::Peekable;

use super::layout::Fragment;

/// Fragments sharing one visual line of one page, left to right.
pub type RowGroup = Vec<Fragment>;

/// Chains sorted fragments into visual rows.
///
/// A row is seeded by the next fragment; following fragments join it while
/// they sit on the same page and their top edge is above the seed's bottom
/// edge. Input must already be ordered by page, `y_min`, `x_min`.
pub struct RowGrouper<I: Iterator<Item = Fragment>> {
    fragments: Peekable<I>,
}

impl<I: Iterator<Item = Fragment>> RowGrouper<I> {
    pub fn new(fragments: I) -> Self {
        Self {
            fragments: fragments.peekable(),
        }
    }
}

impl<I: Iterator<Item = Fragment>> Iterator for RowGrouper<I> {
    type Item = RowGroup;

    fn next(&mut self) -> Option<Self::Item> {
        let seed = self.fragments.next()?;
        let page = seed.page;
        let ceiling = seed.y_max;

        let mut row = vec![seed];
        while let Some(next) = self
            .fragments
            .next_if(|candidate| candidate.page == page && candidate.y_min < ceiling)
        {
            row.push(next);
        }

        row.sort_by(|a, b| a.x_min.total_cmp(&b.x_min));
        Some(row)
    }
}

pub fn group_rows(fragments: Vec<Fragment>) -> RowGrouper<std::vec::IntoIter<Fragment>> {
    RowGrouper::new(fragments.into_iter())
}

pub fn row_text(row: &[Fragment]) -> String {
    row.iter()
        .map(|fragment| fragment.text.as_str())
        .collect::<Vec<&str>>()
        .join(" ")
}
