//! Continuous densities over doubles (or arrays of doubles)
//!
//! Densities are used to weight continuous evidence during likelihood weighting. They can be
//! discretised into a `CategoricalTable` of bucket midpoints whenever a discrete view is
//! needed.

use super::{CategoricalTable, ProbDistribution, DISCRETISATION_BUCKETS};
use crate::util::{DialnetError, Result};
use crate::value::Value;
use crate::variable::Assignment;

use ndarray_rand::rand_distr::{Distribution as RandDistribution, Gamma, Normal};
use rand::{Rng, RngCore};

use std::f64::consts::PI;
use std::fmt;


/// A probability density function.
#[derive(Clone, Debug, PartialEq)]
pub enum DensityFunction {

    /// Normal density
    Gaussian {
        mean: f64,
        variance: f64
    },

    /// Uniform density on `[min, max]`
    Uniform {
        min: f64,
        max: f64
    },

    /// Gaussian kernel density estimate over weighted points
    Kernel {
        points: Vec<f64>,
        weights: Vec<f64>,
        bandwidth: f64
    },

    /// Dirichlet density over the probability simplex
    Dirichlet {
        alphas: Vec<f64>
    }
}

impl DensityFunction {

    /// # Errors
    /// * `DialnetError::MalformedDistribution` if the variance is not positive
    pub fn gaussian(mean: f64, variance: f64) -> Result<Self> {
        if !(variance > 0.0) || !mean.is_finite() {
            return Err(malformed(format!("N({}, {})", mean, variance)));
        }
        Ok(DensityFunction::Gaussian { mean, variance })
    }

    /// # Errors
    /// * `DialnetError::MalformedDistribution` if the interval is empty
    pub fn uniform(min: f64, max: f64) -> Result<Self> {
        if !(min < max) {
            return Err(malformed(format!("U({}, {})", min, max)));
        }
        Ok(DensityFunction::Uniform { min, max })
    }

    /// Kernel density over equally weighted points
    ///
    /// # Errors
    /// * `DialnetError::MalformedDistribution` if no point is given
    pub fn kernel(points: Vec<f64>) -> Result<Self> {
        let weights = vec![1.0; points.len()];
        DensityFunction::weighted_kernel(points, weights)
    }

    /// Kernel density over weighted points. The bandwidth follows Silverman's rule of thumb.
    ///
    /// # Errors
    /// * `DialnetError::MalformedDistribution` if no point is given, or the weights are
    ///   invalid
    pub fn weighted_kernel(points: Vec<f64>, weights: Vec<f64>) -> Result<Self> {
        if points.is_empty() || points.len() != weights.len() {
            return Err(malformed(String::from("kernel requires one weight per point")));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(malformed(String::from("negative kernel weight")));
        }

        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(malformed(String::from("zero kernel weight")));
        }
        let weights: Vec<f64> = weights.iter().map(|w| w / total).collect();

        let mean: f64 = points.iter().zip(weights.iter()).map(|(x, w)| x * w).sum();
        let variance: f64 = points.iter().zip(weights.iter()).map(|(x, w)| w * (x - mean).powi(2)).sum();
        let n = points.len() as f64;
        let mut bandwidth = 1.06 * variance.sqrt() * n.powf(-0.2);
        if bandwidth <= 0.0 {
            bandwidth = MIN_BANDWIDTH;
        }

        Ok(DensityFunction::Kernel { points, weights, bandwidth })
    }

    /// # Errors
    /// * `DialnetError::MalformedDistribution` if less than two (positive) parameters are given
    pub fn dirichlet(alphas: Vec<f64>) -> Result<Self> {
        if alphas.len() < 2 || alphas.iter().any(|a| !(*a > 0.0)) {
            return Err(malformed(format!("Dirichlet{:?}", alphas)));
        }
        Ok(DensityFunction::Dirichlet { alphas })
    }

    /// Dimensionality of the density
    pub fn dimensions(&self) -> usize {
        match self {
            DensityFunction::Dirichlet { alphas } => alphas.len(),
            _ => 1
        }
    }

    /// Density at the given point. Values of the wrong kind have density 0.
    pub fn density(&self, value: &Value) -> f64 {
        match (self, value) {
            (DensityFunction::Dirichlet { alphas }, Value::Array(x)) => dirichlet_density(alphas, x),
            (DensityFunction::Dirichlet { .. }, _) => 0.0,
            (d, v) => v.as_double().map_or(0.0, |x| d.univariate_density(x))
        }
    }

    fn univariate_density(&self, x: f64) -> f64 {
        match self {
            DensityFunction::Gaussian { mean, variance } => gaussian_density(*mean, *variance, x),
            DensityFunction::Uniform { min, max } => {
                if x >= *min && x <= *max { 1.0 / (max - min) } else { 0.0 }
            },
            DensityFunction::Kernel { points, weights, bandwidth } => {
                let h2 = bandwidth * bandwidth;
                points.iter()
                      .zip(weights.iter())
                      .map(|(p, w)| w * gaussian_density(*p, h2, x))
                      .sum()
            },
            DensityFunction::Dirichlet { .. } => 0.0
        }
    }

    /// Draw a point from the density
    ///
    /// # Errors
    /// * `DialnetError::Sampling` if the underlying sampler rejects the parameters
    pub fn sample(&self, rng: &mut dyn RngCore) -> Result<Value> {
        match self {
            DensityFunction::Gaussian { mean, variance } => {
                let normal = Normal::new(*mean, variance.sqrt())
                                 .map_err(|e| DialnetError::Sampling(format!("{:?}", e)))?;
                Ok(Value::Double(normal.sample(&mut *rng)))
            },
            DensityFunction::Uniform { min, max } => Ok(Value::Double(rng.gen_range(*min..*max))),
            DensityFunction::Kernel { points, weights, bandwidth } => {
                let r: f64 = rng.gen();
                let mut acc = 0.0;
                let mut center = points[points.len() - 1];
                for (p, w) in points.iter().zip(weights.iter()) {
                    acc += w;
                    if r < acc {
                        center = *p;
                        break;
                    }
                }
                let normal = Normal::new(center, *bandwidth)
                                 .map_err(|e| DialnetError::Sampling(format!("{:?}", e)))?;
                Ok(Value::Double(normal.sample(&mut *rng)))
            },
            DensityFunction::Dirichlet { alphas } => {
                let mut draws = Vec::with_capacity(alphas.len());
                for a in alphas {
                    let gamma = Gamma::new(*a, 1.0)
                                    .map_err(|e| DialnetError::Sampling(format!("{:?}", e)))?;
                    draws.push(gamma.sample(&mut *rng));
                }
                let total: f64 = draws.iter().sum();
                if total <= 0.0 {
                    return Err(DialnetError::Sampling(String::from("degenerate Dirichlet draw")));
                }
                Ok(Value::Array(draws.iter().map(|d| d / total).collect()))
            }
        }
    }

    /// Mean of the density, one entry per dimension
    pub fn mean(&self) -> Vec<f64> {
        match self {
            DensityFunction::Gaussian { mean, .. } => vec![*mean],
            DensityFunction::Uniform { min, max } => vec![(min + max) / 2.0],
            DensityFunction::Kernel { points, weights, .. } => {
                vec![points.iter().zip(weights.iter()).map(|(p, w)| p * w).sum()]
            },
            DensityFunction::Dirichlet { alphas } => {
                let total: f64 = alphas.iter().sum();
                alphas.iter().map(|a| a / total).collect()
            }
        }
    }

    /// Variance of the density, one entry per dimension
    pub fn variance(&self) -> Vec<f64> {
        match self {
            DensityFunction::Gaussian { variance, .. } => vec![*variance],
            DensityFunction::Uniform { min, max } => vec![(max - min).powi(2) / 12.0],
            DensityFunction::Kernel { points, weights, bandwidth } => {
                let mean: f64 = points.iter().zip(weights.iter()).map(|(p, w)| p * w).sum();
                let spread: f64 = points.iter()
                                        .zip(weights.iter())
                                        .map(|(p, w)| w * (p - mean).powi(2))
                                        .sum();
                vec![spread + bandwidth * bandwidth]
            },
            DensityFunction::Dirichlet { alphas } => {
                let total: f64 = alphas.iter().sum();
                alphas.iter()
                      .map(|a| a * (total - a) / (total * total * (total + 1.0)))
                      .collect()
            }
        }
    }

    /// Split the support of a univariate density into equal-width buckets, and return the
    /// midpoint and probability mass of each.
    ///
    /// # Errors
    /// * `DialnetError::UnsupportedDistribution` for multivariate densities
    pub fn discretise(&self, buckets: usize) -> Result<Vec<(f64, f64)>> {
        let (low, high) = match self {
            DensityFunction::Gaussian { mean, variance } => {
                let sd = variance.sqrt();
                (mean - 4.0 * sd, mean + 4.0 * sd)
            },
            DensityFunction::Uniform { min, max } => (*min, *max),
            DensityFunction::Kernel { points, bandwidth, .. } => {
                let lo = points.iter().cloned().fold(f64::INFINITY, f64::min);
                let hi = points.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                (lo - 4.0 * bandwidth, hi + 4.0 * bandwidth)
            },
            DensityFunction::Dirichlet { .. } => {
                return Err(DialnetError::UnsupportedDistribution(self.to_string()));
            }
        };

        let buckets = buckets.max(1);
        let width = (high - low) / buckets as f64;
        let mut rows: Vec<(f64, f64)> = (0..buckets).map(|i| {
            let mid = low + (i as f64 + 0.5) * width;
            (mid, self.univariate_density(mid) * width)
        }).collect();

        let total: f64 = rows.iter().map(|(_, p)| p).sum();
        if total > 0.0 {
            rows.iter_mut().for_each(|r| r.1 /= total);
        }
        Ok(rows)
    }
}

impl fmt::Display for DensityFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DensityFunction::Gaussian { mean, variance } => write!(f, "N({},{})", mean, variance),
            DensityFunction::Uniform { min, max } => write!(f, "U({},{})", min, max),
            DensityFunction::Kernel { points, bandwidth, .. } => {
                write!(f, "KDE({} points, h={:.4})", points.len(), bandwidth)
            },
            DensityFunction::Dirichlet { alphas } => write!(f, "Dirichlet{:?}", alphas)
        }
    }
}


/// A continuous distribution over a variable. The density does not depend on any parent.
#[derive(Clone, Debug, PartialEq)]
pub struct ContinuousDistribution {
    variable: String,
    density: DensityFunction,

    /// Midpoint and mass of the discretisation buckets, empty for multivariate densities
    buckets: Vec<(f64, f64)>
}

impl ContinuousDistribution {

    pub fn new<S: Into<String>>(variable: S, density: DensityFunction) -> Self {
        let buckets = density.discretise(DISCRETISATION_BUCKETS).unwrap_or_default();
        ContinuousDistribution { variable: variable.into(), density, buckets }
    }

    pub fn density_function(&self) -> &DensityFunction {
        &self.density
    }

    /// Discrete view of the distribution over bucket midpoints
    ///
    /// # Errors
    /// * `DialnetError::UnsupportedDistribution` for multivariate densities
    pub fn discretise(&self, buckets: usize) -> Result<CategoricalTable> {
        self.density
            .discretise(buckets)?
            .into_iter()
            .fold(CategoricalTable::builder(self.variable.clone()), |b, (v, p)| b.add_row(v, p))
            .build_normalised()
    }
}

impl ProbDistribution for ContinuousDistribution {

    fn variable(&self) -> &str {
        &self.variable
    }

    fn sample(&self, _condition: &Assignment, rng: &mut dyn RngCore) -> Result<Value> {
        self.density.sample(rng)
    }

    /// Mass of the discretisation bucket closest to the value
    fn prob(&self, _condition: &Assignment, value: &Value) -> f64 {
        let x = match value.as_double() {
            Some(x) => x,
            None => return 0.0
        };

        self.buckets
            .iter()
            .min_by(|a, b| (a.0 - x).abs().total_cmp(&(b.0 - x).abs()))
            .map_or(0.0, |r| r.1)
    }

    fn density(&self, _condition: &Assignment, value: &Value) -> Option<f64> {
        Some(self.density.density(value))
    }

    fn values(&self, _condition: &Assignment) -> Result<Vec<Value>> {
        Err(DialnetError::UnsupportedDistribution(self.variable.clone()))
    }

    fn is_continuous(&self) -> bool {
        true
    }
}

impl fmt::Display for ContinuousDistribution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PDF({})={}", self.variable, self.density)
    }
}


const MIN_BANDWIDTH: f64 = 1e-3;

fn malformed(msg: String) -> DialnetError {
    DialnetError::MalformedDistribution(String::from("density"), msg)
}

fn gaussian_density(mean: f64, variance: f64, x: f64) -> f64 {
    (-(x - mean).powi(2) / (2.0 * variance)).exp() / (2.0 * PI * variance).sqrt()
}

fn dirichlet_density(alphas: &[f64], x: &[f64]) -> f64 {
    if x.len() != alphas.len() || x.iter().any(|xi| !(*xi > 0.0)) {
        return 0.0;
    }
    let total: f64 = x.iter().sum();
    if (total - 1.0).abs() > 1e-6 {
        return 0.0;
    }

    let alpha_sum: f64 = alphas.iter().sum();
    let log_norm = ln_gamma(alpha_sum) - alphas.iter().map(|a| ln_gamma(*a)).sum::<f64>();
    let log_kernel: f64 = alphas.iter().zip(x.iter()).map(|(a, xi)| (a - 1.0) * xi.ln()).sum();
    (log_norm + log_kernel).exp()
}

// Lanczos approximation (g = 7, n = 9)
#[allow(clippy::excessive_precision)]
fn ln_gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_93,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_13,
        -176.615_029_162_140_59,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_571_6e-6,
        1.505_632_735_149_311_6e-7
    ];

    if x < 0.5 {
        (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x)
    } else {
        let x = x - 1.0;
        let t = x + G + 0.5;
        let a = COEFFS.iter()
                      .enumerate()
                      .skip(1)
                      .fold(COEFFS[0], |acc, (i, c)| acc + c / (x + i as f64));
        0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
    }
}
