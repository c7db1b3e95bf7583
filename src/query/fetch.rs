/// Outcome of one pagination decision during an entry scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDecision {
    /// Fetch this item.
    Fetch,
    /// Not yet past the offset; keep scanning.
    Skip,
    /// Limit reached; stop the scan.
    Stop,
}

/// Offset/limit counters threaded through a scan in filesystem order.
///
/// `offset` only applies when a `limit` is also set; on its own it is
/// ignored and everything is fetched.
#[derive(Debug, Clone, Default)]
pub struct FetchWindow {
    limit: usize,
    offset: usize,
    c_limit: usize,
    c_offset: usize,
}

impl FetchWindow {
    pub fn new(limit: usize, offset: usize) -> Self {
        FetchWindow {
            limit,
            offset,
            c_limit: 0,
            c_offset: 0,
        }
    }

    /// Decide the fate of the next matching item.
    pub fn next(&mut self) -> FetchDecision {
        if self.limit > 0 && self.offset > 0 {
            if self.c_offset >= self.offset {
                if self.c_limit < self.limit {
                    self.c_limit += 1;
                    return FetchDecision::Fetch;
                }
                return FetchDecision::Stop;
            }
            self.c_offset += 1;
            return FetchDecision::Skip;
        }

        if self.limit > 0 {
            if self.c_limit < self.limit {
                self.c_limit += 1;
                return FetchDecision::Fetch;
            }
            return FetchDecision::Stop;
        }

        FetchDecision::Fetch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FetchDecision::{Fetch, Skip, Stop};

    fn run(limit: usize, offset: usize, items: usize) -> Vec<FetchDecision> {
        let mut window = FetchWindow::new(limit, offset);
        let mut decisions = Vec::new();
        for _ in 0..items {
            let decision = window.next();
            decisions.push(decision);
            if decision == Stop {
                break;
            }
        }
        decisions
    }

    #[test]
    fn unbounded_fetches_everything() {
        assert_eq!(run(0, 0, 4), vec![Fetch, Fetch, Fetch, Fetch]);
    }

    #[test]
    fn offset_alone_is_ignored() {
        assert_eq!(run(0, 2, 4), vec![Fetch, Fetch, Fetch, Fetch]);
    }

    #[test]
    fn limit_alone_stops_after_limit() {
        assert_eq!(run(2, 0, 5), vec![Fetch, Fetch, Stop]);
    }

    #[test]
    fn limit_and_offset_skip_then_fetch_then_stop() {
        assert_eq!(run(2, 2, 7), vec![Skip, Skip, Fetch, Fetch, Stop]);
    }

    #[test]
    fn window_larger_than_item_count() {
        assert_eq!(run(5, 2, 4), vec![Skip, Skip, Fetch, Fetch]);
    }
}
