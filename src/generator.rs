/// Synthetic column values: `n_postings_per_term` copies of 0, then as many
/// of 1, and so on. A count of 0 is treated as 1, giving `0, 1, 2, ...`.
///
/// Ends when the next value would overflow `i32`.
#[derive(Debug, Clone)]
pub struct ValueGenerator {
    n_postings_per_term: u32,
    n_postings: u32,
    value: i32,
    exhausted: bool,
}

impl ValueGenerator {
    pub fn new(n_postings_per_term: u32) -> Self {
        ValueGenerator {
            n_postings_per_term: n_postings_per_term.max(1),
            n_postings: 0,
            value: 0,
            exhausted: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn n_postings_per_term(&self) -> u32 {
        self.n_postings_per_term
    }
}

impl Iterator for ValueGenerator {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        if self.exhausted {
            return None;
        }
        if self.n_postings < self.n_postings_per_term {
            self.n_postings += 1;
        } else {
            match self.value.checked_add(1) {
                Some(value) => self.value = value,
                None => {
                    self.exhausted = true;
                    return None;
                }
            }
            self.n_postings = 1;
        }
        Some(self.value)
    }
}
