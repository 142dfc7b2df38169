use std::collections::BTreeMap;

/// A set of disjoint half-open `[start, end)` character ranges.
///
/// Overlapping or touching claims are merged, so membership is a single
/// ordered-map lookup.
#[derive(Debug, Clone, Default)]
pub struct ClaimedSpans {
    spans: BTreeMap<usize, usize>,
}

impl ClaimedSpans {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `pos` falls inside a claimed range.
    pub fn contains(&self, pos: usize) -> bool {
        self.spans
            .range(..=pos)
            .next_back()
            .is_some_and(|(_, &end)| pos < end)
    }

    /// Whether `[start, end)` lies entirely inside one claimed range.
    pub fn covers(&self, start: usize, end: usize) -> bool {
        self.spans
            .range(..=start)
            .next_back()
            .is_some_and(|(_, &claimed)| start < claimed && end <= claimed)
    }

    /// Claim `[start, end)`. Empty ranges are ignored.
    pub fn claim(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }

        let mut merged_start = start;
        let mut merged_end = end;

        if let Some((&prev_start, &prev_end)) =
            self.spans.range(..=start).next_back()
            && prev_end >= start
        {
            merged_start = prev_start;
            merged_end = merged_end.max(prev_end);
        }

        let absorbed: Vec<usize> = self
            .spans
            .range(merged_start..=merged_end)
            .map(|(&s, _)| s)
            .collect();
        for s in absorbed {
            if let Some(e) = self.spans.remove(&s) {
                merged_end = merged_end.max(e);
            }
        }

        self.spans.insert(merged_start, merged_end);
    }

    /// Number of disjoint ranges.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.spans.iter().map(|(&s, &e)| (s, e))
    }
}
