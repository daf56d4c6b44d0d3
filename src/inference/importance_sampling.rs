//! Defines an importance-sampling `InferenceAlgorithm` for approximate inference using
//! particle-based approximations.
//!
//! Implementation of Importance Sampling via Normalized Likelihood Weighting, described in Koller &
//! Friedman 12.2.3.3. Particles are drawn by a pool of worker threads, then resampled in
//! proportion to their weights so the result is an unweighted set of samples.

use super::{reduce_from_joint, CancellationToken, InferenceAlgorithm, QueryResult, SamplingConfig};
use crate::distribution::{EmpiricalDistribution, MultivariateTable, UtilityTable};
use crate::model::{Network, NodeType};
use crate::query::{Query, QueryType};
use crate::samplers::{Intervals, LikelihoodWeightedSampler, Sample, WeightedSampler};
use crate::util::{DialnetError, Result};
use crate::variable::Assignment;

use crossbeam_channel::{bounded, RecvTimeoutError};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, warn};

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};


/// Longest wait of the collector between two checks of the cancellation token
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Samples buffered per worker in the collection channel
const CHANNEL_DEPTH: usize = 64;

/// Stream of the seeded generator used for resampling, apart from the streams of the samples
const RESAMPLING_STREAM: usize = usize::MAX;


/// An `InferenceAlgorithm` using likelihood weighting
#[derive(Clone, Debug, Default)]
pub struct LikelihoodWeighting {

    config: SamplingConfig,

    /// Stops the sampling early when cancelled
    cancellation: Option<CancellationToken>
}

impl LikelihoodWeighting {

    pub fn new(config: SamplingConfig) -> Self {
        LikelihoodWeighting { config, cancellation: None }
    }

    /// Stop sampling as soon as the token is cancelled, keeping the samples collected so far
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    fn cancelled(&self) -> bool {
        self.cancellation.as_ref().map_or(false, CancellationToken::is_cancelled)
    }


    /// Collect up to `nb_samples` weighted samples of the query variables.
    ///
    /// Sampling stops when enough samples are accepted, when the time limit is reached, or when
    /// the cancellation token is cancelled. Samples in progress are always completed. The
    /// samples are returned in the order they were started; with a seed, each one is drawn
    /// from its own generator so the result does not depend on thread scheduling.
    ///
    /// # Errors
    /// * `DialnetError::InferenceFailure` if no sample was accepted
    pub fn collect_samples(&self, query: &Query) -> Result<Vec<Sample>> {
        let target = self.config.nb_samples;
        if target == 0 {
            return Err(DialnetError::InferenceFailure(
                format!("no sample requested for {}, nb_samples must be positive", query)));
        }

        let sampler = LikelihoodWeightedSampler::new(query, self.config.weight_threshold);
        let workers = self.config.worker_count.max(1);
        let seed = self.config.seed;
        let deadline = Instant::now() + self.config.max_sampling_time;

        let stop = AtomicBool::new(false);
        let next_index = AtomicUsize::new(0);
        let (tx, rx) = bounded::<(usize, Sample)>(workers * CHANNEL_DEPTH);

        let mut accepted = thread::scope(|s| {
            for _ in 0..workers {
                let tx = tx.clone();
                let (sampler, stop, next_index) = (&sampler, &stop, &next_index);

                s.spawn(move || {
                    let mut worker_rng = StdRng::from_entropy();
                    while !stop.load(Ordering::Relaxed) {
                        let index = next_index.fetch_add(1, Ordering::Relaxed);
                        let outcome = match seed {
                            Some(seed) => draw(sampler, &mut sample_rng(seed, index)),
                            None => draw(sampler, &mut worker_rng)
                        };

                        if let Some(sample) = outcome {
                            if tx.send((index, sample)).is_err() {
                                break;
                            }
                        }
                    }
                });
            }
            drop(tx);

            let mut accepted = Vec::with_capacity(target);
            while accepted.len() < target {
                if self.cancelled() {
                    debug!("sampling cancelled");
                    break;
                }

                let now = Instant::now();
                if now >= deadline {
                    debug!(collected = accepted.len(), "sampling time is over");
                    break;
                }

                match rx.recv_timeout((deadline - now).min(POLL_INTERVAL)) {
                    Ok(item) => accepted.push(item),
                    Err(RecvTimeoutError::Timeout) => (),
                    Err(RecvTimeoutError::Disconnected) => break
                }
            }

            // samples already started are completed and kept
            stop.store(true, Ordering::Relaxed);
            accepted.extend(rx.iter());
            accepted
        });

        accepted.sort_by_key(|(index, _)| *index);
        accepted.truncate(target);
        debug!(accepted = accepted.len(),
               attempted = next_index.load(Ordering::Relaxed),
               "likelihood weighting samples collected");

        if accepted.is_empty() {
            return Err(DialnetError::InferenceFailure(
                format!("no sample of {} reached the weight threshold", query)));
        }
        Ok(accepted.into_iter().map(|(_, sample)| sample).collect())
    }


    /// Resample the weighted samples in proportion to their weights, into as many unweighted
    /// samples. Weights are taken relative to the largest one, so large densities do not
    /// overflow.
    ///
    /// # Errors
    /// * `DialnetError::InferenceFailure` if all weights are 0
    pub fn redraw(&self, samples: Vec<Sample>) -> Result<Vec<Sample>> {
        let n = samples.len();
        let max = samples.iter().map(Sample::log_weight).fold(f64::NEG_INFINITY, f64::max);
        let intervals = Intervals::new(samples, |s| (s.log_weight() - max).exp())?;

        let mut rng = match self.config.seed {
            Some(seed) => sample_rng(seed, RESAMPLING_STREAM),
            None => StdRng::from_entropy()
        };
        Ok((0..n).map(|_| intervals.sample(&mut rng).clone()).collect())
    }

    /// Collect and resample samples of the query variables
    ///
    /// # Errors
    /// * `DialnetError::InferenceFailure` if no sample was accepted
    pub fn sample_posterior(&self, query: &Query) -> Result<Vec<Sample>> {
        let samples = self.collect_samples(query)?;
        self.redraw(samples)
    }

    /// Posterior distribution of the query variables, as a set of samples
    ///
    /// # Errors
    /// * `DialnetError::InferenceFailure` if no sample was accepted
    pub fn query_samples(&self, query: &Query) -> Result<EmpiricalDistribution> {
        let samples = self.sample_posterior(query)?;
        Ok(EmpiricalDistribution::new(samples.into_iter().map(Sample::into_assignment).collect()))
    }

    /// Expected utility of the network: the average total utility of its utility nodes
    ///
    /// # Errors
    /// * `DialnetError::InferenceFailure` if no sample was accepted
    pub fn expected_utility(&self, network: &Network) -> Result<f64> {
        let query = Query::utility(network, network.node_ids_of_type(NodeType::Chance), Assignment::new())?;
        let samples = self.sample_posterior(&query)?;
        Ok(samples.iter().map(Sample::utility).sum::<f64>() / samples.len() as f64)
    }
}


fn sample_rng(seed: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Draw one sample. Failures drop the sample without stopping the collection.
fn draw(sampler: &LikelihoodWeightedSampler, rng: &mut dyn RngCore) -> Option<Sample> {
    match panic::catch_unwind(AssertUnwindSafe(|| sampler.weighted_sample(rng))) {
        Ok(Ok(sample)) => sample,
        Ok(Err(e)) => {
            debug!(error = %e, "sample dropped");
            None
        },
        Err(_) => {
            warn!("sampling panicked, sample dropped");
            None
        }
    }
}


impl InferenceAlgorithm for LikelihoodWeighting {

    fn query_prob(&self, query: &Query) -> Result<MultivariateTable> {
        self.query_samples(query)?.to_table()
    }

    fn query_util(&self, query: &Query) -> Result<UtilityTable> {
        if query.kind() != QueryType::Utility {
            return Err(DialnetError::InvalidQuery(format!("{} is not a utility query", query)));
        }

        let mut table = UtilityTable::new();
        for sample in self.sample_posterior(query)? {
            let utility = sample.utility();
            table.increment_util(sample.into_assignment(), utility);
        }
        Ok(table)
    }

    fn reduce(&self, query: &Query) -> Result<Network> {
        let samples: Vec<Assignment> = self.sample_posterior(query)?
                                           .into_iter()
                                           .map(Sample::into_assignment)
                                           .collect();

        let network = query.network();
        let (continuous, discrete): (Vec<String>, Vec<String>) =
            query.sorted_query_vars()
                 .into_iter()
                 .partition(|var| network.node(var).map_or(false, |n| n.is_continuous()));

        let mut kernels = Vec::with_capacity(continuous.len());
        for var in continuous.iter() {
            let values: Vec<Assignment> = samples.iter().map(|s| s.restrict_to(&[var])).collect();
            kernels.push(EmpiricalDistribution::new(values).to_continuous()?);
        }

        let joint = EmpiricalDistribution::new(samples.iter().map(|s| s.restrict_to(&discrete)).collect())
                        .to_table()?;
        reduce_from_joint(query, &joint, &kernels)
    }

    /// Probability queries are answered by the posterior samples themselves
    fn run(&self, query: &Query) -> Result<QueryResult> {
        match query.kind() {
            QueryType::Probability => self.query_samples(query).map(QueryResult::Samples),
            QueryType::Utility => self.query_util(query).map(QueryResult::Utility),
            QueryType::Reduction => self.reduce(query).map(QueryResult::Network)
        }
    }
}
