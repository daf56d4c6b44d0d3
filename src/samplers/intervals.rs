//! Weighted selection over a fixed set of items, used to resample weighted particles.

use crate::util::{DialnetError, Result};

use rand::{Rng, RngCore};


/// Items laid out on consecutive intervals of the real line, each as long as its weight.
/// Drawing a uniform point and finding its interval selects an item with probability
/// proportional to its weight.
#[derive(Clone, Debug)]
pub struct Intervals<T> {
    items: Vec<T>,

    /// Upper bound of each item's interval
    bounds: Vec<f64>
}

impl<T> Intervals<T> {

    /// Lay out the items with the weights given by `weight`
    ///
    /// # Errors
    /// * `DialnetError::InferenceFailure` if there are no items, a weight is negative or not
    ///   finite, or all weights are 0
    pub fn new<F>(items: Vec<T>, weight: F) -> Result<Self>
        where F: Fn(&T) -> f64
    {
        let mut bounds = Vec::with_capacity(items.len());
        let mut total = 0.0;
        for item in items.iter() {
            let w = weight(item);
            if !w.is_finite() || w < 0.0 {
                return Err(DialnetError::InferenceFailure(format!("invalid interval weight {}", w)));
            }
            total += w;
            bounds.push(total);
        }

        if !(total > 0.0) {
            return Err(DialnetError::InferenceFailure(String::from("no interval with positive weight")));
        }

        Ok(Intervals { items, bounds })
    }

    fn total(&self) -> f64 {
        self.bounds.last().copied().unwrap_or(0.0)
    }

    /// Select an item with probability proportional to its weight
    pub fn sample(&self, rng: &mut dyn RngCore) -> &T {
        let point = rng.gen::<f64>() * self.total();
        let i = self.bounds.partition_point(|&b| b <= point);
        &self.items[i.min(self.items.len() - 1)]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn proportional_selection() {
        let intervals = Intervals::new(vec!["a", "b", "c", "d"], |s| match *s {
            "a" => 1.0,
            "b" => 0.0,
            "c" => 3.0,
            _ => 6.0
        }).expect("unexpected error");
        assert_eq!(4, intervals.len());

        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = [0usize; 4];
        for _ in 0..20000 {
            let i = match *intervals.sample(&mut rng) {
                "a" => 0,
                "b" => 1,
                "c" => 2,
                _ => 3
            };
            counts[i] += 1;
        }

        // a zero-weight item is never selected
        assert_eq!(0, counts[1]);
        assert!((counts[0] as f64 / 20000.0 - 0.1).abs() < 0.02);
        assert!((counts[2] as f64 / 20000.0 - 0.3).abs() < 0.02);
        assert!((counts[3] as f64 / 20000.0 - 0.6).abs() < 0.02);
    }

    #[test]
    fn invalid_weights() {
        assert!(Intervals::new(Vec::<f64>::new(), |w| *w).is_err());
        assert!(Intervals::new(vec![0.0, 0.0], |w| *w).is_err());
        assert!(Intervals::new(vec![1.0, -1.0], |w| *w).is_err());
        assert!(Intervals::new(vec![1.0, f64::NAN], |w| *w).is_err());
    }
}
