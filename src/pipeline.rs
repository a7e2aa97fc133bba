//! # Run Driver
//!
//! ```text
//!  EventSource ──drain──► Vec<Event> ──par_iter──► Vec<ClusteredEvent>
//!                                                        │ event order
//!                                                        ▼
//!                      RunSummary ◄── JetClusterer::record ──► CsvJetWriter
//! ```
//!
//! Ingestion completes before any clustering starts, so a malformed source
//! aborts the run with nothing written. Events cluster independently on the
//! rayon pool; results are collected in event order and written one event at
//! a time, so rows of different events never interleave.

use rayon::prelude::*;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::collider::{
    ClusteredEvent, ConservationSummary, Event, EventClustering, JetClusterer, MetricsReport,
};
use crate::config::{ClusterConfig, RunConfig};
use crate::error::JetError;
use crate::sink::CsvJetWriter;
use crate::source::{BinaryEventSource, EventSource};
use crate::JetResult;

/// Totals of a finished run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub events: usize,
    pub particles: usize,
    pub jets: usize,
    /// Jets that passed the output filter
    pub jets_written: usize,
    pub merges: usize,
    pub elapsed: Duration,
    pub conservation: ConservationSummary,
    pub metrics: MetricsReport,
}

impl RunSummary {
    pub fn summary(&self) -> String {
        let rate = if self.elapsed.as_secs_f64() > 0.0 {
            self.events as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        };
        format!(
            "Clustered {} events ({} particles) into {} jets, {} written, {} merges in {:.3}s ({:.1} events/s)\n{}",
            self.events,
            self.particles,
            self.jets,
            self.jets_written,
            self.merges,
            self.elapsed.as_secs_f64(),
            rate,
            self.conservation.summary()
        )
    }
}

/// Cluster every event on the current rayon pool, keeping event order
pub fn cluster_all(events: Vec<Event>, config: &ClusterConfig) -> Vec<ClusteredEvent> {
    let clusterer = JetClusterer::new(config.clone());
    cluster_with(&clusterer, events)
}

fn cluster_with(clusterer: &JetClusterer, events: Vec<Event>) -> Vec<ClusteredEvent> {
    events
        .into_par_iter()
        .map(|event| {
            let clustered = clusterer.cluster(event);
            log::debug!(
                "Event {} finished! Found {} jets",
                clustered.event_id,
                clustered.jets.len()
            );
            clustered
        })
        .collect()
}

/// Run a full clustering pass from `source` into `sink`
pub fn run<S, W>(source: S, sink: &mut CsvJetWriter<W>, config: &RunConfig) -> JetResult<RunSummary>
where
    S: EventSource,
    W: Write,
{
    config.validate()?;
    let start = Instant::now();

    let expected = source.num_events();
    log::info!("Reading {} events", expected);
    let events = source.drain()?;
    log::info!(
        "Clustering {} events with R = {} on {} threads",
        events.len(),
        config.cluster.radius,
        rayon::current_num_threads()
    );

    let mut clusterer = JetClusterer::from_run_config(config);
    let clustered = cluster_with(&clusterer, events);

    let mut summary = RunSummary {
        events: clustered.len(),
        particles: 0,
        jets: 0,
        jets_written: 0,
        merges: 0,
        elapsed: Duration::ZERO,
        conservation: ConservationSummary::default(),
        metrics: MetricsReport::new(),
    };

    for event in &clustered {
        let emitted = clusterer.record(event);
        summary.particles += event.input_particles;
        summary.jets += event.jets.len();
        summary.merges += event.merges();
        summary.jets_written += sink.write_jets(&emitted)?;
    }

    let (conservation, metrics) = clusterer.into_reports();
    summary.conservation = conservation;
    summary.metrics = metrics;
    summary.elapsed = start.elapsed();

    log::info!(
        "Finished {} events in {:.3}s: {} jets, {} written",
        summary.events,
        summary.elapsed.as_secs_f64(),
        summary.jets,
        summary.jets_written
    );
    Ok(summary)
}

/// [`run`] on a dedicated pool of `threads` workers
pub fn run_with_threads<S, W>(
    source: S,
    sink: &mut CsvJetWriter<W>,
    config: &RunConfig,
    threads: usize,
) -> JetResult<RunSummary>
where
    S: EventSource + Send,
    W: Write + Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| JetError::InvalidParameter(format!("thread pool: {}", e)))?;
    pool.install(|| run(source, sink, config))
}

/// Run an opened source into a CSV file created at `output`
///
/// The file is created only after the source opened cleanly, so a missing or
/// malformed input leaves an existing output file untouched.
pub fn run_to_csv<S>(
    source: S,
    output: impl AsRef<Path>,
    config: &RunConfig,
    threads: usize,
) -> JetResult<RunSummary>
where
    S: EventSource + Send,
{
    config.validate()?;
    let mut sink = CsvJetWriter::create(output, config.output.track_event_ids)?;
    let summary = run_with_threads(source, &mut sink, config, threads)?;
    sink.finish()?;
    Ok(summary)
}

/// Cluster a flat f32 blob file into a CSV file
pub fn run_blob_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &RunConfig,
    threads: usize,
) -> JetResult<RunSummary> {
    let source = BinaryEventSource::open(input, &config.layout)?;
    run_to_csv(source, output, config, threads)
}

/// Cluster one event step by step, logging and recording each transition
pub fn trace_event(event: Event, config: &ClusterConfig) -> ClusteredEvent {
    let mut clustering = EventClustering::new(event, config).with_history();
    while let Some(transition) = clustering.step() {
        log::debug!(
            "event {}: {:?} ({} active)",
            clustering.event_id(),
            transition,
            clustering.active().len()
        );
    }
    clustering.run()
}
