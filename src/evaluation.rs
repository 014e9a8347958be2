use std::fmt;

/// Whether an evaluation proved its score within the requested depth and
/// time, or ran out of budget partway through
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Completeness {
    Aborted,
    Exhaustive,
}

/// Result of evaluating one search node: completeness, the depth of the
/// shallowest proven subtree, and the best score/column found so far.
/// Created fresh per node and folded together with `update_with_child`.
#[derive(Copy, Clone, Debug)]
pub struct Evaluation {
    pub completeness: Completeness,
    /// Depth of sub-tree actually explored below this node
    pub relative_depth: u32,
    pub score: Option<i32>,
    pub column: Option<usize>,
}

impl Evaluation {
    pub fn new() -> Self {
        Self {
            completeness: Completeness::Exhaustive,
            relative_depth: 0,
            score: None,
            column: None,
        }
    }

    pub fn aborted() -> Self {
        Self {
            completeness: Completeness::Aborted,
            ..Self::new()
        }
    }

    pub fn exhaustive(score: i32, relative_depth: u32) -> Self {
        Self {
            completeness: Completeness::Exhaustive,
            relative_depth,
            score: Some(score),
            column: None,
        }
    }

    /// Folds the evaluation of the position after playing `column` into
    /// this one.
    ///
    /// An aborted child makes this evaluation aborted too, while keeping any
    /// best score/column already found as a partial recommendation. An
    /// exhaustive child lowers `relative_depth` to the shallowest proven
    /// subtree plus one. The child's score is negated and adopted only when
    /// strictly better than the current best.
    ///
    /// Returns true when the best score changed, so the caller can tighten
    /// its pruning window.
    pub fn update_with_child(&mut self, child: Evaluation, column: usize) -> bool {
        if child.completeness == Completeness::Aborted {
            self.completeness = Completeness::Aborted;
        } else {
            let subtree_depth = child.relative_depth + 1;
            self.relative_depth = if self.relative_depth == 0 {
                subtree_depth
            } else {
                self.relative_depth.min(subtree_depth)
            };
        }

        if let Some(child_score) = child.score {
            if self.score.map_or(true, |best| -child_score > best) {
                self.score = Some(-child_score);
                self.column = Some(column);
                return true;
            }
        }

        false
    }

    /// Checks that the evaluation carries a column worth physically playing
    pub fn is_playable(&self) -> bool {
        self.column.is_some() && self.score.is_some()
    }
}

impl Default for Evaluation {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.score {
            Some(score) => {
                write!(f, "{}", score)?;
                if let Some(column) = self.column {
                    write!(f, " by playing column {}", column)?;
                }
            }
            None => write!(f, "?")?,
        }
        match self.completeness {
            Completeness::Aborted => write!(f, " (partial search)"),
            Completeness::Exhaustive => {
                write!(f, " (exhaustive search: depth {})", self.relative_depth)
            }
        }
    }
}
