use super::{Record, RowSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Transient view criteria. Never persisted and never part of history: filter
/// only shapes the rendered projection, while the sort column is remembered
/// here so that repeated sorts of the same column toggle direction.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub filter: String,
    pub sort_column: Option<String>,
    pub direction: SortDirection,
}

impl ViewState {
    /// Registers a sort request on `column`: same column toggles direction,
    /// a new column starts ascending.
    pub fn sort_on(&mut self, column: &str) {
        if self.sort_column.as_deref() == Some(column) {
            self.direction = self.direction.toggled();
        } else {
            self.sort_column = Some(column.to_string());
            self.direction = SortDirection::Ascending;
        }
    }

    /// Drops the sort criteria so the projection falls back to the stored
    /// record order. Called whenever the store is restored or replaced
    /// wholesale, where re-sorting would hide the new order.
    pub fn clear_sort(&mut self) {
        self.sort_column = None;
        self.direction = SortDirection::default();
    }
}

/// Derives the rendered row order from the store and the view criteria. Pure:
/// the store is not touched. Returns `(original_index, record)` pairs so the
/// caller can map a selection in the view back onto the store.
pub fn project<'a>(rowset: &'a RowSet, view: &ViewState) -> Vec<(usize, &'a Record)> {
    let needle = view.filter.to_lowercase();
    let mut rows: Vec<(usize, &Record)> = rowset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, record)| needle.is_empty() || matches_filter(record, rowset.columns(), &needle))
        .collect();

    if let Some(column) = view.sort_column.as_deref() {
        // Stable sort keeps the relative order of equal keys.
        rows.sort_by(|(_, a), (_, b)| {
            let ordering = natural_cmp(cell(a, column), cell(b, column));
            match view.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
    rows
}

fn cell<'a>(record: &'a Record, column: &str) -> &'a str {
    record.get(column).map(String::as_str).unwrap_or("")
}

/// A record matches when the lowercase concatenation of all its cells (in
/// column order, missing keys blank) contains the lowercase needle.
fn matches_filter(record: &Record, columns: &[String], needle: &str) -> bool {
    let haystack: String = columns
        .iter()
        .map(|column| cell(record, column).to_lowercase())
        .collect();
    haystack.contains(needle)
}

/// Case-insensitive comparison that orders runs of digits by numeric
/// magnitude, so "3" sorts before "10" and "row2" before "row10".
pub fn natural_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    let mut ca = a.chars().peekable();
    let mut cb = b.chars().peekable();
    loop {
        match (ca.peek().copied(), cb.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let na = take_digits(&mut ca);
                let nb = take_digits(&mut cb);
                let ordering = cmp_digits(&na, &nb);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                let xl = x.to_lowercase();
                let yl = y.to_lowercase();
                let ordering = xl.cmp(yl);
                if ordering != Ordering::Equal {
                    return ordering;
                }
                ca.next();
                cb.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}

/// Compares two ASCII digit runs by magnitude without parsing, so arbitrarily
/// long runs cannot overflow.
fn cmp_digits(a: &str, b: &str) -> std::cmp::Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
