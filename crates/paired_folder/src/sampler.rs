use anyhow::{ensure, Result};
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A `Sampler` decides the order in which dataset indices are visited.
///
/// `iter(epoch)` returns the sequence for that epoch. Randomised samplers mix
/// the epoch into their seed so each epoch gets a fresh, reproducible order.
///
/// Implementations must be `Send + Sync` so one sampler can be shared by the
/// threads that call [`PairedImageFolder::get`](crate::PairedImageFolder::get).
pub trait Sampler: Send + Sync {
    fn iter(&self, epoch: usize) -> Box<dyn Iterator<Item = usize> + Send + '_>;

    /// Number of indices one epoch yields.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// ============================================================================
/// Yields indices sequentially in order `(0,1,2,...,dataset_size-1)`.
///
/// # Examples
/// ```ignore
/// let sampler = SequentialSampler::new(dataset.len());
/// let indices: Vec<_> = sampler.iter(0).collect();
/// ```
#[derive(Debug, Clone)]
pub struct SequentialSampler {
    dataset_size: usize,
}

impl SequentialSampler {
    pub fn new(dataset_size: usize) -> Self {
        Self { dataset_size }
    }
}

impl Sampler for SequentialSampler {
    fn iter(&self, _epoch: usize) -> Box<dyn Iterator<Item = usize> + Send + '_> {
        Box::new(0..self.dataset_size)
    }

    fn len(&self) -> usize {
        self.dataset_size
    }
}

/// ============================================================================
/// Random uniform sampling over `0..dataset_size`, with optional replacement.
///
/// # Arguments:
/// - `dataset_size`: Total number of samples in a dataset.
/// - `replacement`: If `true`, each draw is independent and indices may repeat;
///                  If `false`, each index can only appear once.
/// - `num_samples`: Number of indices per epoch (defaults to `dataset_size`).
///                  Without replacement it must not exceed `dataset_size`.
/// - `base_seed`: Base RNG seed.
///
/// The RNG for epoch `e` is seeded with `base_seed + e`: the same seed gives
/// the same order every run, while consecutive epochs still differ.
///
/// # Example usage
/// ```ignore
/// let sampler = RandomSampler::new(dataset.len(), false, None, 42)?;
/// for index in sampler.iter(epoch) {
///     let (image, target) = dataset.get(index)?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RandomSampler {
    dataset_size: usize,
    replacement: bool,
    num_samples: usize,
    base_seed: u64,
}

impl RandomSampler {
    pub fn new(
        dataset_size: usize,
        replacement: bool,
        num_samples: Option<usize>,
        base_seed: u64,
    ) -> Result<Self> {
        let num_samples = num_samples.unwrap_or(dataset_size);
        ensure!(
            num_samples > 0,
            "num_samples must be a positive integer value, but got num_samples={}",
            num_samples
        );
        ensure!(
            dataset_size > 0,
            "cannot sample from an empty dataset"
        );
        if !replacement {
            ensure!(
                num_samples <= dataset_size,
                "num_samples ({}) exceeds dataset size ({}) without replacement",
                num_samples,
                dataset_size
            );
        }

        Ok(Self {
            dataset_size,
            replacement,
            num_samples,
            base_seed,
        })
    }

    #[inline]
    fn derive_rng_for_epoch(&self, epoch: usize) -> StdRng {
        StdRng::seed_from_u64(self.base_seed.wrapping_add(epoch as u64))
    }
}

impl Sampler for RandomSampler {
    fn iter(&self, epoch: usize) -> Box<dyn Iterator<Item = usize> + Send + '_> {
        let mut rng = self.derive_rng_for_epoch(epoch);
        if self.replacement {
            Box::new((0..self.num_samples).map(move |_| rng.random_range(0..self.dataset_size)))
        } else {
            let mut indices: Vec<_> = (0..self.dataset_size).collect();
            indices.shuffle(&mut rng);
            indices.truncate(self.num_samples);
            Box::new(indices.into_iter())
        }
    }

    fn len(&self) -> usize {
        self.num_samples
    }
}
