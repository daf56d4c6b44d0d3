//! Defines a `Sampler` for likelihood weighted particle generation over the relevant nodes of a
//! `Query`.
//!
//! Koller & Friedman Algorithm 12.2 (pp 493), extended with action and utility nodes.

use super::{Sample, WeightedSampler};
use crate::distribution::ProbDistribution;
use crate::model::NodeKind;
use crate::query::Query;
use crate::util::Result;

use rand::RngCore;


/// Weight under which samples are rejected
pub const WEIGHT_THRESHOLD: f64 = 1e-4;


/// Draws samples of the query variables, weighted by the likelihood of the evidence.
///
/// The relevant nodes of the query are visited parents first. Evidence variables are not
/// sampled: their observed value is kept and the sample weight is multiplied by its
/// probability (or density) given the values drawn so far. Utility nodes add their utility
/// to the sample.
#[derive(Clone, Debug)]
pub struct LikelihoodWeightedSampler<'a> {

    /// The query to answer
    query: &'a Query<'a>,

    /// Samples of lower weight are rejected
    threshold: f64,

    /// The variables kept in the returned samples
    query_vars: Vec<String>
}

impl<'a> LikelihoodWeightedSampler<'a> {

    pub fn new(query: &'a Query<'a>, threshold: f64) -> Self {
        let query_vars = query.sorted_query_vars();
        LikelihoodWeightedSampler { query, threshold, query_vars }
    }

    /// Draw a full sample over the relevant nodes, before rejection and trimming
    pub fn full_sample(&self, rng: &mut dyn RngCore) -> Result<Sample> {
        let evidence = self.query.evidence();
        let mut sample = Sample::new();

        for node in self.query.filtered_sorted_nodes() {
            let id = node.id();

            match node.kind() {
                NodeKind::Chance(chance) => match evidence.get(id) {
                    // a prior over an observed root only rescales every weight
                    Some(value) if node.inputs().is_empty() => sample.set(id, value.clone()),
                    Some(value) => {
                        let likelihood = if chance.is_continuous() {
                            chance.distrib()
                                  .density(sample.assignment(), value)
                                  .unwrap_or(0.0)
                        } else {
                            chance.prob(sample.assignment(), value)
                        };
                        sample.add_log_weight(likelihood.ln());
                        sample.set(id, value.clone());
                    },
                    None => {
                        let value = chance.sample(sample.assignment(), rng)?;
                        sample.set(id, value);
                    }
                },
                NodeKind::Action(action) => match evidence.get(id) {
                    Some(value) if node.inputs().is_empty() => sample.set(id, value.clone()),
                    Some(value) => {
                        sample.add_log_weight(action.prob(value).ln());
                        sample.set(id, value.clone());
                    },
                    None => sample.set(id, action.sample(rng))
                },
                NodeKind::Utility(utility) => {
                    let parents = sample.assignment().restrict_to(node.inputs());
                    sample.add_utility(utility.utility(&parents));
                }
            }

            if sample.log_weight() == f64::NEG_INFINITY {
                break;
            }
        }

        Ok(sample)
    }
}

impl<'a> WeightedSampler for LikelihoodWeightedSampler<'a> {

    fn weighted_sample(&self, rng: &mut dyn RngCore) -> Result<Option<Sample>> {
        let mut sample = self.full_sample(rng)?;
        if sample.weight() < self.threshold {
            return Ok(None);
        }

        sample.trim(&self.query_vars);
        if sample.assignment().is_empty() {
            return Ok(None);
        }
        Ok(Some(sample))
    }
}
