//! Settings of the inference algorithms. Both structures can be loaded from a host
//! application's settings; durations are written in milliseconds.

use crate::samplers::likelihood::WEIGHT_THRESHOLD;

use serde::{Deserialize, Serialize};

use std::time::Duration;


/// Settings of likelihood weighting
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {

    /// Number of samples to collect
    pub nb_samples: usize,

    /// Time after which sampling stops, whatever the number of samples collected
    #[serde(with = "millis")]
    pub max_sampling_time: Duration,

    /// Samples of lower weight are rejected
    pub weight_threshold: f64,

    /// Number of sampling threads
    pub worker_count: usize,

    /// Seed of the random number generators. Seeded runs that are not cut by the time limit
    /// return the same samples.
    pub seed: Option<u64>
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            nb_samples: 5000,
            max_sampling_time: Duration::from_millis(250),
            weight_threshold: WEIGHT_THRESHOLD,
            worker_count: std::thread::available_parallelism().map_or(1, |n| n.get()),
            seed: None
        }
    }
}

impl SamplingConfig {

    pub fn with_nb_samples(mut self, nb_samples: usize) -> Self {
        self.nb_samples = nb_samples;
        self
    }

    pub fn with_max_sampling_time(mut self, max_sampling_time: Duration) -> Self {
        self.max_sampling_time = max_sampling_time;
        self
    }

    pub fn with_weight_threshold(mut self, weight_threshold: f64) -> Self {
        self.weight_threshold = weight_threshold;
        self
    }

    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}


/// Settings of the `SwitchingAlgorithm`: queries over networks within these bounds are
/// answered exactly, the others by sampling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchingConfig {

    /// Largest number of parents of a relevant node
    pub max_branching_factor: usize,

    /// Largest number of query variables
    pub max_query_vars: usize,

    /// Largest number of relevant continuous nodes
    pub max_continuous: usize,

    pub sampling: SamplingConfig
}

impl Default for SwitchingConfig {
    fn default() -> Self {
        SwitchingConfig {
            max_branching_factor: 4,
            max_query_vars: 2,
            max_continuous: 0,
            sampling: SamplingConfig::default()
        }
    }
}

impl SwitchingConfig {

    pub fn with_max_branching_factor(mut self, max_branching_factor: usize) -> Self {
        self.max_branching_factor = max_branching_factor;
        self
    }

    pub fn with_max_query_vars(mut self, max_query_vars: usize) -> Self {
        self.max_query_vars = max_query_vars;
        self
    }

    pub fn with_max_continuous(mut self, max_continuous: usize) -> Self {
        self.max_continuous = max_continuous;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }
}


mod millis {
    use serde::{Deserialize, Deserializer, Serializer};

    use std::convert::TryFrom;
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(d: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        u64::deserialize(de).map(Duration::from_millis)
    }
}
