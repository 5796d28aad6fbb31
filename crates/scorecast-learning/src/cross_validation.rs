//! K-fold cross-validation and the optional parameter grid search.

use crate::config::ParamGrid;
use crate::error::{LearningError, Result};
use crate::metrics::r2_score;
use crate::models::{ModelKind, Regressor, rng_from_seed};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A single train/validation split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Shuffled k-fold splits. The first `n % k` folds get one extra row.
pub fn k_fold_split(n_samples: usize, n_splits: usize, seed: Option<u64>) -> Result<Vec<CVSplit>> {
    if n_splits < 2 {
        return Err(LearningError::InvalidConfig(
            "n_splits must be at least 2".to_string(),
        ));
    }
    if n_samples < n_splits {
        return Err(LearningError::InvalidInput(format!(
            "n_samples ({}) must be >= n_splits ({})",
            n_samples, n_splits
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    indices.shuffle(&mut rng_from_seed(seed));

    let base = n_samples / n_splits;
    let remainder = n_samples % n_splits;

    let mut splits = Vec::with_capacity(n_splits);
    let mut current = 0;
    for fold_idx in 0..n_splits {
        let fold_size = if fold_idx < remainder { base + 1 } else { base };
        let test_indices = indices[current..current + fold_size].to_vec();
        let train_indices = indices[..current]
            .iter()
            .chain(indices[current + fold_size..].iter())
            .copied()
            .collect();

        splits.push(CVSplit {
            train_indices,
            test_indices,
            fold_idx,
        });
        current += fold_size;
    }

    Ok(splits)
}

/// Every combination of the grid, varying the last parameter (by name)
/// fastest. An empty grid yields one empty combination.
pub fn expand_grid(grid: &ParamGrid) -> Vec<BTreeMap<String, f64>> {
    let mut combos = vec![BTreeMap::new()];
    for (name, values) in grid {
        combos = combos
            .into_iter()
            .flat_map(|combo| {
                values.iter().map(move |&v| {
                    let mut next = combo.clone();
                    next.insert(name.clone(), v);
                    next
                })
            })
            .collect();
    }
    combos
}

/// Winning combination of a grid search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSearchResult {
    pub params: BTreeMap<String, f64>,
    /// Mean validation R² across folds
    pub cv_score: f64,
}

/// Score each grid combination by mean k-fold R²; the first best wins.
pub fn grid_search(
    kind: ModelKind,
    grid: &ParamGrid,
    x: &Array2<f64>,
    y: &Array1<f64>,
    n_folds: usize,
    seed: Option<u64>,
) -> Result<GridSearchResult> {
    let splits = k_fold_split(x.nrows(), n_folds, seed)?;
    let mut best: Option<GridSearchResult> = None;

    for params in expand_grid(grid) {
        let mut total = 0.0;
        for split in &splits {
            let mut model = kind.build(seed);
            for (name, &value) in &params {
                model.set_param(name, value)?;
            }

            let x_train = x.select(Axis(0), &split.train_indices);
            let y_train = y.select(Axis(0), &split.train_indices);
            let x_val = x.select(Axis(0), &split.test_indices);
            let y_val = y.select(Axis(0), &split.test_indices);

            model.fit(&x_train, &y_train)?;
            total += r2_score(&y_val, &model.predict(&x_val)?)?;
        }

        let cv_score = total / splits.len() as f64;
        debug!(model = %kind, ?params, cv_score, "Grid point scored");

        if best.as_ref().is_none_or(|b| cv_score > b.cv_score) {
            best = Some(GridSearchResult { params, cv_score });
        }
    }

    best.ok_or_else(|| LearningError::InvalidConfig(format!("empty parameter grid for '{kind}'")))
}

/// Grids searched when tuning is enabled and no override is configured.
pub fn default_param_grids() -> BTreeMap<ModelKind, ParamGrid> {
    fn grid(entries: Vec<(&str, Vec<f64>)>) -> ParamGrid {
        entries
            .into_iter()
            .map(|(name, values)| (name.to_string(), values))
            .collect()
    }

    BTreeMap::from([
        (
            ModelKind::DecisionTree,
            grid(vec![("max_depth", vec![4.0, 8.0, 16.0])]),
        ),
        (
            ModelKind::KNeighbors,
            grid(vec![("n_neighbors", vec![5.0, 7.0, 9.0, 11.0])]),
        ),
        (
            ModelKind::AdaBoost,
            grid(vec![
                ("learning_rate", vec![0.1, 0.5, 1.0]),
                ("n_estimators", vec![32.0, 64.0]),
            ]),
        ),
        (
            ModelKind::GradientBoosting,
            grid(vec![
                ("learning_rate", vec![0.05, 0.1]),
                ("n_estimators", vec![64.0, 128.0]),
                ("subsample", vec![0.8, 1.0]),
            ]),
        ),
        (
            ModelKind::RandomForest,
            grid(vec![("n_estimators", vec![32.0, 64.0, 128.0])]),
        ),
        (
            ModelKind::XGBoost,
            grid(vec![
                ("learning_rate", vec![0.05, 0.1, 0.3]),
                ("n_estimators", vec![64.0, 128.0]),
            ]),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::linear_data;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_k_fold_partitions_rows() {
        let splits = k_fold_split(10, 3, Some(4)).unwrap();
        let sizes: Vec<usize> = splits.iter().map(|s| s.test_indices.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);

        let mut seen: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());

        for split in &splits {
            assert_eq!(split.train_indices.len() + split.test_indices.len(), 10);
            assert!(split.train_indices.iter().all(|i| !split.test_indices.contains(i)));
        }
    }

    #[test]
    fn test_k_fold_is_seeded() {
        let a = k_fold_split(20, 4, Some(1)).unwrap();
        let b = k_fold_split(20, 4, Some(1)).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.test_indices, y.test_indices);
        }
    }

    #[test]
    fn test_k_fold_rejects_too_few_rows() {
        assert!(k_fold_split(2, 3, None).is_err());
        assert!(k_fold_split(10, 1, None).is_err());
    }

    #[test]
    fn test_expand_grid_order() {
        let mut grid = ParamGrid::new();
        grid.insert("a".to_string(), vec![1.0, 2.0]);
        grid.insert("b".to_string(), vec![10.0, 20.0, 30.0]);

        let combos = expand_grid(&grid);
        assert_eq!(combos.len(), 6);
        let pairs: Vec<(f64, f64)> = combos.iter().map(|c| (c["a"], c["b"])).collect();
        assert_eq!(
            pairs,
            vec![
                (1.0, 10.0),
                (1.0, 20.0),
                (1.0, 30.0),
                (2.0, 10.0),
                (2.0, 20.0),
                (2.0, 30.0),
            ]
        );

        assert_eq!(expand_grid(&ParamGrid::new()).len(), 1);
    }

    #[test]
    fn test_grid_search_scores_every_combination() {
        let (x, y) = linear_data(60, 3);
        let mut grid = ParamGrid::new();
        grid.insert("n_neighbors".to_string(), vec![1.0, 2.0]);

        let result = grid_search(ModelKind::KNeighbors, &grid, &x, &y, 3, Some(0)).unwrap();
        assert!(result.params.contains_key("n_neighbors"));
        assert!(result.cv_score > 0.5);
    }

    #[test]
    fn test_grid_search_surfaces_bad_param() {
        let (x, y) = linear_data(30, 3);
        let mut grid = ParamGrid::new();
        grid.insert("n_neighbors".to_string(), vec![0.0]);
        assert!(grid_search(ModelKind::KNeighbors, &grid, &x, &y, 3, Some(0)).is_err());
    }

    #[test]
    fn test_default_grids_use_known_params() {
        for (kind, grid) in default_param_grids() {
            let mut model = kind.build(Some(0));
            for (name, values) in &grid {
                assert!(!values.is_empty());
                model.set_param(name, values[0]).unwrap();
            }
        }
    }
}
