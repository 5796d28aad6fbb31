//! CART regression tree with the squared-error criterion.

use super::{
    ModelKind, Regressor, check_fit_input, check_predict_input, param_as_count, unknown_param,
};
use crate::error::{LearningError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64 },
    /// Internal node: rows with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Best threshold found for one node.
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    /// Maximum depth; `None` grows until leaves are pure or too small.
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    root: Option<TreeNode>,
    n_features: usize,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            root: None,
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    /// Fit on the subset `rows` of `x`/`y`. Rows may repeat (bootstrap).
    pub(crate) fn fit_rows(&mut self, x: &Array2<f64>, y: &Array1<f64>, rows: &[usize]) -> Result<()> {
        if rows.is_empty() {
            return Err(LearningError::InvalidInput(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }
        self.n_features = x.ncols();
        let mut rows = rows.to_vec();
        self.root = Some(self.build(x, y, &mut rows, 0));
        Ok(())
    }

    fn build(&self, x: &Array2<f64>, y: &Array1<f64>, rows: &mut [usize], depth: usize) -> TreeNode {
        let n = rows.len();
        let sum: f64 = rows.iter().map(|&i| y[i]).sum();
        let mean = sum / n as f64;

        let depth_reached = self.max_depth.is_some_and(|d| depth >= d);
        let pure = rows.iter().all(|&i| (y[i] - mean).abs() <= 1e-12 * mean.abs().max(1.0));
        if n < self.min_samples_split || n < 2 * self.min_samples_leaf || depth_reached || pure {
            return TreeNode::Leaf { value: mean };
        }

        let Some(split) = self.find_best_split(x, y, rows, sum) else {
            return TreeNode::Leaf { value: mean };
        };

        let (mut left, mut right): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&i| x[[i, split.feature]] <= split.threshold);

        TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.build(x, y, &mut left, depth + 1)),
            right: Box::new(self.build(x, y, &mut right, depth + 1)),
        }
    }

    /// Sorted scan per feature; maximizes the reduction in squared error.
    /// Ties keep the earliest feature and lowest threshold.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rows: &mut [usize],
        total_sum: f64,
    ) -> Option<SplitCandidate> {
        let n = rows.len();
        let parent_score = total_sum * total_sum / n as f64;
        let mut best: Option<SplitCandidate> = None;

        for feature in 0..x.ncols() {
            rows.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

            let mut left_sum = 0.0;
            for pos in 0..n - 1 {
                left_sum += y[rows[pos]];
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let here = x[[rows[pos], feature]];
                let next = x[[rows[pos + 1], feature]];
                if here >= next {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let score =
                    left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
                let gain = score - parent_score;

                if gain > 1e-12 && best.as_ref().is_none_or(|b| gain > b.gain) {
                    let mut threshold = here + (next - here) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }
}

impl Regressor for DecisionTreeRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let rows: Vec<usize> = (0..x.nrows()).collect();
        self.fit_rows(x, y, &rows)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(LearningError::NotFitted)?;
        check_predict_input(x, self.n_features)?;
        Ok(x.rows().into_iter().map(|row| root.predict_row(row)).collect())
    }

    fn set_param(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            "max_depth" => self.max_depth = Some(param_as_count(name, value)?),
            "min_samples_split" => self.min_samples_split = param_as_count(name, value)?.max(2),
            "min_samples_leaf" => self.min_samples_leaf = param_as_count(name, value)?,
            _ => return Err(unknown_param(ModelKind::DecisionTree, name)),
        }
        Ok(())
    }
}
