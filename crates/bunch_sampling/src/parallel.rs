//! Batch generation across worker threads.
//!
//! Samplers are single threaded. A batch of `n` events is split into
//! contiguous chunks and each worker builds its own sampler on random stream
//! `worker`, so a given `(seed, workers)` pair always reproduces the same
//! output regardless of scheduling. Event indices stay global, which keeps
//! the bunch timing identical to a single sampler run.
//!
//! File-based distributions replay one shared sequence and always run on a
//! single worker.
//!
//! With the `parallel` feature disabled the chunks run one after another.

use std::ops::Range;

use bunch_core::types::{BunchError, FullGlobalCoords, ReferenceParticle};
use tracing::{debug, info};

use crate::bunch::{SamplerFactory, DEFAULT_MAX_TRIES};
use crate::config::{BeamDefinition, DistributionType};

/// Split of a batch into per-worker event ranges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchPlan {
    chunks: Vec<Range<usize>>,
}

impl BatchPlan {
    /// Splits `n_events` over `workers` workers.
    ///
    /// `workers == 0` means one per available thread. File-based kinds are
    /// forced to one worker. No worker receives an empty chunk.
    pub fn new(kind: DistributionType, n_events: usize, workers: usize) -> Self {
        let requested = if workers == 0 { available_threads() } else { workers };
        let workers = if kind.is_file_based() {
            if requested > 1 {
                info!(distribution = %kind, "File replay runs on a single worker");
            }
            1
        } else {
            requested.clamp(1, n_events.max(1))
        };

        let base = n_events / workers;
        let extra = n_events % workers;
        let mut start = 0;
        let chunks = (0..workers)
            .map(|w| {
                let len = base + usize::from(w < extra);
                let range = start..start + len;
                start += len;
                range
            })
            .filter(|r| !r.is_empty())
            .collect();
        Self { chunks }
    }

    /// Event ranges in worker order.
    pub fn chunks(&self) -> &[Range<usize>] {
        &self.chunks
    }

    /// Number of workers that receive events.
    pub fn workers(&self) -> usize {
        self.chunks.len()
    }
}

/// Generates `n_events` valid particles using up to `workers` samplers.
///
/// Results are returned in event order.
///
/// # Errors
///
/// The first failure of any worker: building the sampler, preparing the run
/// (in batch mode a replay file must cover its chunk) or generating.
///
/// # Example
///
/// ```rust
/// use bunch_core::types::{ParticleDefinition, ParticleSpecies};
/// use bunch_sampling::bunch::SamplerFactory;
/// use bunch_sampling::config::BeamDefinition;
/// use bunch_sampling::parallel::generate_parallel;
///
/// let proton = ParticleDefinition::from_total_energy(ParticleSpecies::PROTON, 7000.0).unwrap();
/// let beam = BeamDefinition { envelope_x: 1e-3, envelope_y: 1e-3, ..BeamDefinition::of_type("square") };
/// let factory = SamplerFactory::new().with_seed(7);
///
/// let bunch = generate_parallel(&factory, &proton, &beam, 1000, 4).unwrap();
/// assert_eq!(bunch.len(), 1000);
/// ```
pub fn generate_parallel<R>(
    factory: &SamplerFactory,
    reference: &R,
    definition: &BeamDefinition,
    n_events: usize,
    workers: usize,
) -> Result<Vec<FullGlobalCoords>, BunchError>
where
    R: ReferenceParticle + Sync + ?Sized,
{
    let kind: DistributionType = definition.distr_type.parse()?;
    let plan = BatchPlan::new(kind, n_events, workers);
    info!(
        distribution = %kind,
        events = n_events,
        workers = plan.workers(),
        "Generating bunch"
    );

    let chunks = run_chunks(factory, reference, definition, plan.chunks())?;
    Ok(chunks.into_iter().flatten().collect())
}

#[cfg(feature = "parallel")]
fn run_chunks<R>(
    factory: &SamplerFactory,
    reference: &R,
    definition: &BeamDefinition,
    chunks: &[Range<usize>],
) -> Result<Vec<Vec<FullGlobalCoords>>, BunchError>
where
    R: ReferenceParticle + Sync + ?Sized,
{
    use rayon::prelude::*;

    chunks
        .par_iter()
        .enumerate()
        .map(|(worker, range)| {
            generate_chunk(factory, reference, definition, worker as u64, range.clone())
        })
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn run_chunks<R>(
    factory: &SamplerFactory,
    reference: &R,
    definition: &BeamDefinition,
    chunks: &[Range<usize>],
) -> Result<Vec<Vec<FullGlobalCoords>>, BunchError>
where
    R: ReferenceParticle + Sync + ?Sized,
{
    chunks
        .iter()
        .enumerate()
        .map(|(worker, range)| {
            generate_chunk(factory, reference, definition, worker as u64, range.clone())
        })
        .collect()
}

/// Runs one worker's share on its own sampler.
pub fn generate_chunk<R>(
    factory: &SamplerFactory,
    reference: &R,
    definition: &BeamDefinition,
    stream: u64,
    events: Range<usize>,
) -> Result<Vec<FullGlobalCoords>, BunchError>
where
    R: ReferenceParticle + ?Sized,
{
    let mut sampler = factory.build_stream(reference, definition, stream)?;
    sampler.begin_of_run(events.len(), true)?;
    debug!(stream, start = events.start, end = events.end, "Worker started");

    let mut out = Vec::with_capacity(events.len());
    for event in events {
        sampler.set_event_index(event);
        sampler.reset_event_counters();
        out.push(sampler.next_valid(DEFAULT_MAX_TRIES)?);
    }
    Ok(out)
}

#[cfg(feature = "parallel")]
fn available_threads() -> usize {
    rayon::current_num_threads()
}

#[cfg(not(feature = "parallel"))]
fn available_threads() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use bunch_core::types::{ParticleDefinition, ParticleSpecies};

    fn proton() -> ParticleDefinition {
        ParticleDefinition::from_total_energy(ParticleSpecies::PROTON, 7000.0).unwrap()
    }

    fn square() -> BeamDefinition {
        BeamDefinition {
            envelope_x: 1e-3,
            envelope_y: 2e-3,
            envelope_xp: 1e-4,
            envelope_yp: 1e-4,
            ..BeamDefinition::of_type("square")
        }
    }

    #[test]
    fn test_plan_splits_evenly() {
        let plan = BatchPlan::new(DistributionType::Square, 10, 3);
        assert_eq!(plan.chunks(), &[0..4, 4..7, 7..10]);
    }

    #[test]
    fn test_plan_never_has_empty_chunks() {
        let plan = BatchPlan::new(DistributionType::Gauss, 2, 8);
        assert_eq!(plan.workers(), 2);
        assert!(BatchPlan::new(DistributionType::Gauss, 0, 4).chunks().is_empty());
    }

    #[test]
    fn test_plan_file_kinds_single_worker() {
        let plan = BatchPlan::new(DistributionType::Ptc, 100, 8);
        assert_eq!(plan.chunks(), &[0..100]);
    }

    #[test]
    fn test_output_matches_chunks_in_order() {
        let factory = SamplerFactory::new().with_seed(11);
        let beam = square();
        let all = generate_parallel(&factory, &proton(), &beam, 50, 3).unwrap();

        let mut expected = Vec::new();
        for (worker, range) in BatchPlan::new(DistributionType::Square, 50, 3)
            .chunks()
            .iter()
            .enumerate()
        {
            expected.extend(
                generate_chunk(&factory, &proton(), &beam, worker as u64, range.clone()).unwrap(),
            );
        }
        assert_eq!(all, expected);
    }

    #[test]
    fn test_single_worker_matches_plain_sampler() {
        let factory = SamplerFactory::new().with_seed(3);
        let beam = square();
        let batch = generate_parallel(&factory, &proton(), &beam, 20, 1).unwrap();
        let direct = factory.build(&proton(), &beam).unwrap().generate(20).unwrap();
        assert_eq!(batch, direct);
    }

    #[test]
    fn test_bad_tag_fails_before_work() {
        let factory = SamplerFactory::new();
        let err = generate_parallel(&factory, &proton(), &BeamDefinition::of_type("nope"), 5, 2)
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
