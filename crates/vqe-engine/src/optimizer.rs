//! Nelder-Mead simplex minimizer over an asynchronous objective.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineResult;

/// A function the optimizer can evaluate.
#[async_trait]
pub trait Objective: Send {
    /// Value at `parameters`.
    async fn evaluate(&mut self, parameters: &[f64]) -> EngineResult<f64>;
}

/// When to stop iterating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceCriteria {
    /// Upper bound on simplex iterations.
    pub max_iterations: usize,
    /// Stop once best and worst simplex values are closer than this.
    pub energy_delta: f64,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            energy_delta: 1e-6,
        }
    }
}

/// Result of a minimization.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// Best parameters found.
    pub optimal_params: Vec<f64>,
    /// Objective value at `optimal_params`.
    pub optimal_value: f64,
    /// Objective evaluations performed.
    pub num_evaluations: usize,
    /// Simplex iterations performed.
    pub num_iterations: usize,
    /// Whether the energy delta criterion was met.
    pub converged: bool,
}

/// Nelder-Mead with the standard coefficients.
#[derive(Debug, Clone)]
pub struct NelderMead {
    criteria: ConvergenceCriteria,
    initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            criteria: ConvergenceCriteria::default(),
            initial_step: 0.5,
        }
    }
}

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

impl NelderMead {
    /// Create a new optimizer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace both stopping criteria.
    #[must_use]
    pub fn with_criteria(mut self, criteria: ConvergenceCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Set maximum iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.criteria.max_iterations = max_iterations;
        self
    }

    /// Set the energy delta tolerance.
    #[must_use]
    pub fn with_energy_delta(mut self, energy_delta: f64) -> Self {
        self.criteria.energy_delta = energy_delta;
        self
    }

    /// Set the edge length of the initial simplex.
    #[must_use]
    pub fn with_initial_step(mut self, initial_step: f64) -> Self {
        self.initial_step = initial_step;
        self
    }

    /// Stopping criteria in use.
    pub fn criteria(&self) -> &ConvergenceCriteria {
        &self.criteria
    }

    /// Minimize `objective` starting from `initial`.
    pub async fn minimize<O>(&self, objective: &mut O, initial: &[f64]) -> EngineResult<OptimizationResult>
    where
        O: Objective + ?Sized,
    {
        let n = initial.len();
        let mut num_evaluations = 0;

        if n == 0 {
            let value = objective.evaluate(initial).await?;
            return Ok(OptimizationResult {
                optimal_params: Vec::new(),
                optimal_value: value,
                num_evaluations: 1,
                num_iterations: 0,
                converged: true,
            });
        }

        // Initial simplex: x0 plus one step along each axis.
        let mut simplex = Vec::with_capacity(n + 1);
        simplex.push(initial.to_vec());
        for i in 0..n {
            let mut vertex = initial.to_vec();
            vertex[i] += self.initial_step;
            simplex.push(vertex);
        }
        let mut values = Vec::with_capacity(n + 1);
        for vertex in &simplex {
            values.push(objective.evaluate(vertex).await?);
            num_evaluations += 1;
        }

        let mut num_iterations = 0;
        let mut converged = false;

        loop {
            order(&mut simplex, &mut values);
            if values[n] - values[0] < self.criteria.energy_delta {
                converged = true;
                break;
            }
            if num_iterations >= self.criteria.max_iterations {
                break;
            }
            num_iterations += 1;

            let centroid = centroid(&simplex[..n]);
            let reflected = along(&centroid, &simplex[n], -REFLECTION);
            let f_reflected = objective.evaluate(&reflected).await?;
            num_evaluations += 1;

            if f_reflected < values[0] {
                let expanded = along(&centroid, &simplex[n], -EXPANSION);
                let f_expanded = objective.evaluate(&expanded).await?;
                num_evaluations += 1;
                if f_expanded < f_reflected {
                    simplex[n] = expanded;
                    values[n] = f_expanded;
                } else {
                    simplex[n] = reflected;
                    values[n] = f_reflected;
                }
                continue;
            }

            if f_reflected < values[n - 1] {
                simplex[n] = reflected;
                values[n] = f_reflected;
                continue;
            }

            let (contracted, threshold) = if f_reflected < values[n] {
                (along(&centroid, &reflected, CONTRACTION), f_reflected)
            } else {
                (along(&centroid, &simplex[n], CONTRACTION), values[n])
            };
            let f_contracted = objective.evaluate(&contracted).await?;
            num_evaluations += 1;
            if f_contracted < threshold {
                simplex[n] = contracted;
                values[n] = f_contracted;
                continue;
            }

            // Shrink towards the best vertex.
            let best = simplex[0].clone();
            for i in 1..=n {
                simplex[i] = along(&best, &simplex[i], SHRINK);
                values[i] = objective.evaluate(&simplex[i]).await?;
                num_evaluations += 1;
            }
        }

        debug!(
            num_iterations,
            num_evaluations,
            converged,
            optimal_value = values[0],
            "Nelder-Mead finished"
        );

        Ok(OptimizationResult {
            optimal_params: simplex.swap_remove(0),
            optimal_value: values[0],
            num_evaluations,
            num_iterations,
            converged,
        })
    }
}

/// Sort vertices by value, best first.
fn order(simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    *simplex = indices.iter().map(|&i| simplex[i].clone()).collect();
    *values = indices.iter().map(|&i| values[i]).collect();
}

fn centroid(points: &[Vec<f64>]) -> Vec<f64> {
    let dim = points[0].len();
    let mut c = vec![0.0; dim];
    for p in points {
        for (ci, pi) in c.iter_mut().zip(p) {
            *ci += pi;
        }
    }
    let count = points.len() as f64;
    c.iter_mut().for_each(|ci| *ci /= count);
    c
}

/// `origin + t·(target − origin)`.
fn along(origin: &[f64], target: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(target)
        .map(|(o, x)| o + t * (x - o))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Quadratic {
        calls: usize,
    }

    #[async_trait]
    impl Objective for Quadratic {
        async fn evaluate(&mut self, p: &[f64]) -> EngineResult<f64> {
            self.calls += 1;
            Ok((p[0] - 1.0).powi(2) + 2.0 * (p[1] + 0.5).powi(2) + 3.0)
        }
    }

    struct Constant;

    #[async_trait]
    impl Objective for Constant {
        async fn evaluate(&mut self, p: &[f64]) -> EngineResult<f64> {
            assert!(p.is_empty());
            Ok(-2.5)
        }
    }

    #[tokio::test]
    async fn test_minimizes_quadratic() {
        let mut objective = Quadratic { calls: 0 };
        let result = NelderMead::new()
            .with_energy_delta(1e-12)
            .minimize(&mut objective, &[0.0, 0.0])
            .await
            .unwrap();

        assert!(result.converged);
        assert!((result.optimal_value - 3.0).abs() < 1e-8);
        assert!((result.optimal_params[0] - 1.0).abs() < 1e-3);
        assert!((result.optimal_params[1] + 0.5).abs() < 1e-3);
        assert_eq!(result.num_evaluations, objective.calls);
    }

    #[tokio::test]
    async fn test_iteration_cap() {
        let mut objective = Quadratic { calls: 0 };
        let result = NelderMead::new()
            .with_max_iterations(3)
            .with_energy_delta(0.0)
            .minimize(&mut objective, &[5.0, 5.0])
            .await
            .unwrap();
        assert!(!result.converged);
        assert_eq!(result.num_iterations, 3);
    }

    #[tokio::test]
    async fn test_no_parameters() {
        let result = NelderMead::new().minimize(&mut Constant, &[]).await.unwrap();
        assert!(result.converged);
        assert_eq!(result.num_evaluations, 1);
        assert_eq!(result.optimal_value, -2.5);
    }
}
