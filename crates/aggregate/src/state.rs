use std::fmt;

/// Position of a run in the aggregation state machine.
///
/// ```text
/// Search -> Merge -> Search      (page carried a NextToken)
///                 -> WriteFinal  (no NextToken)
/// WriteFinal -> Notify -> Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationState {
    Search,
    Merge,
    WriteFinal,
    Notify,
    Done,
}

impl AggregationState {
    /// The state that follows this one. `has_more` is only consulted after
    /// a merge: it is whether the merged page carried a continuation token.
    pub fn next(self, has_more: bool) -> AggregationState {
        match self {
            AggregationState::Search => AggregationState::Merge,
            AggregationState::Merge if has_more => AggregationState::Search,
            AggregationState::Merge => AggregationState::WriteFinal,
            AggregationState::WriteFinal => AggregationState::Notify,
            AggregationState::Notify | AggregationState::Done => AggregationState::Done,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == AggregationState::Done
    }
}

impl fmt::Display for AggregationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AggregationState::Search => "Search",
            AggregationState::Merge => "Merge",
            AggregationState::WriteFinal => "WriteFinal",
            AggregationState::Notify => "Notify",
            AggregationState::Done => "Done",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::AggregationState::*;

    #[test]
    fn merge_loops_back_while_token_present() {
        assert_eq!(Merge.next(true), Search);
        assert_eq!(Merge.next(false), WriteFinal);
    }

    #[test]
    fn tail_of_the_machine_is_linear() {
        assert_eq!(Search.next(false), Merge);
        assert_eq!(Search.next(true), Merge);
        assert_eq!(WriteFinal.next(true), Notify);
        assert_eq!(Notify.next(false), Done);
        assert!(Done.next(true).is_terminal());
    }
}
