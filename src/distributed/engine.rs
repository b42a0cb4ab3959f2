//! Distributed index engine.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::distributed::config::DistributedIndexConfig;
use crate::distributed::merger::{self, merge_search_results, merge_suggestions};
use crate::distributed::metrics::{DistributedMetrics, DistributedMetricsCollector, ReadKind};
use crate::document::document::Document;
use crate::document::suggestion::Suggestion;
use crate::error::{Result, ShardBenchError};
use crate::index::autocomplete::Autocompleter;
use crate::index::index::{Index, SearchResults};
use crate::index::memory::{MemoryAutocompleter, MemoryIndex};
use crate::index::metadata::Metadata;
use crate::index::options::IndexingOptions;
use crate::partition::partitioner::{ModuloPartitioner, Partitioner, split_by_key};
use crate::pool::work_queue::WorkQueue;
use crate::query::query::Query;

/// A merged search page together with every shard failure.
#[derive(Debug)]
pub struct PartialSearch {
    /// Merged results from the shards that responded.
    pub results: SearchResults,

    /// Shard errors ordered by shard index.
    pub errors: Vec<ShardBenchError>,
}

impl PartialSearch {
    /// Check whether every shard answered successfully.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// The results, or the lowest-index shard error if any shard failed.
    pub fn into_result(self) -> Result<SearchResults> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.results),
        }
    }
}

/// Merged suggestions together with every shard failure.
#[derive(Debug)]
pub struct PartialSuggest {
    /// Top suggestions from the shards that responded.
    pub suggestions: Vec<Suggestion>,

    /// Shard errors ordered by shard index.
    pub errors: Vec<ShardBenchError>,
}

/// Outputs and errors of one read fan-out.
struct FanOut<T> {
    outputs: Vec<T>,
    errors: Vec<ShardBenchError>,
    timed_out: bool,
}

/// One logical index backed by independent shards.
///
/// Writes are routed to the shard chosen by the partitioner for each
/// document id or suggestion term. Reads go to every shard through the
/// worker pool and are merged by descending score.
///
/// ```
/// use shardbench::distributed::config::DistributedIndexConfig;
/// use shardbench::distributed::engine::DistributedIndex;
/// use shardbench::document::document::Document;
/// use shardbench::index::index::Index;
/// use shardbench::index::metadata::Metadata;
/// use shardbench::index::options::IndexingOptions;
/// use shardbench::query::query::Query;
///
/// let config = DistributedIndexConfig::new(2).with_pool_workers(4);
/// let index = DistributedIndex::in_memory("idx", Metadata::wikipedia(), config).unwrap();
/// index.create().unwrap();
///
/// let docs = vec![
///     Document::new("a", 0.4).set("title", "hello"),
///     Document::new("b", 0.9).set("title", "hello world"),
/// ];
/// index.index(docs, &IndexingOptions::default()).unwrap();
///
/// let results = index.search(&Query::new("hello")).unwrap();
/// assert_eq!(results.total, 2);
/// assert_eq!(results.documents[0].id(), "b");
/// ```
#[derive(Debug)]
pub struct DistributedIndex {
    /// Logical index name.
    name: String,

    /// Configuration.
    config: DistributedIndexConfig,

    /// Index shards, one per partition.
    shards: Vec<Arc<dyn Index>>,

    /// Autocompleter shards, one per partition.
    autocompleters: Vec<Arc<dyn Autocompleter>>,

    /// Routing of writes.
    partitioner: Box<dyn Partitioner>,

    /// Pool running shard reads.
    pool: WorkQueue,

    /// Read metrics.
    metrics: DistributedMetricsCollector,
}

impl DistributedIndex {
    /// Create a distributed index over caller-supplied shards.
    pub fn new<S: Into<String>>(
        name: S,
        shards: Vec<Arc<dyn Index>>,
        autocompleters: Vec<Arc<dyn Autocompleter>>,
        partitioner: Box<dyn Partitioner>,
        config: DistributedIndexConfig,
    ) -> Result<Self> {
        config.validate()?;
        partitioner.validate()?;

        let partitions = config.partitions;
        if partitioner.partition_count() != partitions {
            return Err(ShardBenchError::invalid_config(format!(
                "partitioner has {} partitions, expected {partitions}",
                partitioner.partition_count()
            )));
        }
        if shards.len() != partitions {
            return Err(ShardBenchError::invalid_config(format!(
                "got {} index shards for {partitions} partitions",
                shards.len()
            )));
        }
        if autocompleters.len() != partitions {
            return Err(ShardBenchError::invalid_config(format!(
                "got {} autocompleter shards for {partitions} partitions",
                autocompleters.len()
            )));
        }

        let pool = WorkQueue::new(config.pool_size())?;
        let name = name.into();

        debug!(
            "distributed index '{name}' over {partitions} shards using {}",
            partitioner.description()
        );

        Ok(Self {
            name,
            config,
            shards,
            autocompleters,
            partitioner,
            pool,
            metrics: DistributedMetricsCollector::new(),
        })
    }

    /// Create a distributed index routed by CRC32 modulo the partition count.
    pub fn with_modulo<S: Into<String>>(
        name: S,
        shards: Vec<Arc<dyn Index>>,
        autocompleters: Vec<Arc<dyn Autocompleter>>,
        config: DistributedIndexConfig,
    ) -> Result<Self> {
        let partitioner = ModuloPartitioner::new(config.partitions)?;
        Self::new(name, shards, autocompleters, Box::new(partitioner), config)
    }

    /// Create a distributed index over fresh in-memory shards.
    pub fn in_memory<S: Into<String>>(
        name: S,
        metadata: Metadata,
        config: DistributedIndexConfig,
    ) -> Result<Self> {
        Self::in_memory_with_latency(name, metadata, config, None)
    }

    /// Create a distributed index over in-memory shards that each add `latency` to reads.
    pub fn in_memory_with_latency<S: Into<String>>(
        name: S,
        metadata: Metadata,
        config: DistributedIndexConfig,
        latency: Option<Duration>,
    ) -> Result<Self> {
        let name = name.into();
        let mut shards: Vec<Arc<dyn Index>> = Vec::with_capacity(config.partitions);
        let mut autocompleters: Vec<Arc<dyn Autocompleter>> =
            Vec::with_capacity(config.partitions);

        for i in 0..config.partitions {
            let mut index = MemoryIndex::new(format!("{name}{{{i}}}"), metadata.clone());
            let mut ac = MemoryAutocompleter::new(format!("{name}.ac{{{i}}}"));
            if let Some(latency) = latency {
                index = index.with_latency(latency);
                ac = ac.with_latency(latency);
            }
            shards.push(Arc::new(index));
            autocompleters.push(Arc::new(ac));
        }

        Self::with_modulo(name, shards, autocompleters, config)
    }

    /// Configuration.
    pub fn config(&self) -> &DistributedIndexConfig {
        &self.config
    }

    /// Number of shards.
    pub fn partitions(&self) -> usize {
        self.shards.len()
    }

    /// Routing used for writes.
    pub fn partitioner(&self) -> &dyn Partitioner {
        self.partitioner.as_ref()
    }

    /// The index shard at `shard`.
    pub fn shard(&self, shard: usize) -> Option<&Arc<dyn Index>> {
        self.shards.get(shard)
    }

    /// Current read metrics.
    pub fn metrics(&self) -> DistributedMetrics {
        self.metrics.snapshot()
    }

    /// Reset read metrics.
    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    /// Stop the read pool. Later reads fail with [`ShardBenchError::PoolClosed`].
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }

    /// Search every shard and merge, keeping all shard errors.
    pub fn search_partial(&self, query: &Query) -> PartialSearch {
        let start = Instant::now();
        let shard_query = merger::shard_query(query);

        let fan_out =
            self.fan_out_reads(self.shards.as_slice(), move |shard| shard.search(&shard_query));

        let results = merge_search_results(fan_out.outputs, query.paging);
        self.record(ReadKind::Search, start, &fan_out.errors, fan_out.timed_out);

        PartialSearch {
            results,
            errors: fan_out.errors,
        }
    }

    /// Ask every autocompleter shard and merge, keeping all shard errors.
    pub fn suggest_partial(&self, prefix: &str, count: usize, fuzzy: bool) -> PartialSuggest {
        let start = Instant::now();
        let prefix = prefix.to_string();

        let fan_out = self.fan_out_reads(self.autocompleters.as_slice(), move |ac| {
            ac.suggest(&prefix, count, fuzzy)
        });

        let suggestions = merge_suggestions(fan_out.outputs, count);
        self.record(ReadKind::Suggest, start, &fan_out.errors, fan_out.timed_out);

        PartialSuggest {
            suggestions,
            errors: fan_out.errors,
        }
    }

    fn record(&self, kind: ReadKind, start: Instant, errors: &[ShardBenchError], timed_out: bool) {
        if self.config.enable_metrics {
            self.metrics
                .record(kind, start.elapsed(), errors.len(), timed_out);
        }
    }

    /// Run `op` against every target on the pool and gather outputs and errors.
    fn fan_out_reads<S, T, F>(&self, targets: &[Arc<S>], op: F) -> FanOut<T>
    where
        S: ?Sized + Send + Sync + 'static,
        T: Send + 'static,
        F: Fn(&S) -> Result<T> + Clone + Send + 'static,
    {
        let mut errors: Vec<ShardBenchError> = Vec::new();
        let mut submitted = vec![false; targets.len()];

        let mut group = self.pool.task_group::<(usize, Result<T>)>();
        for (i, target) in targets.iter().enumerate() {
            let op = op.clone();
            let target = Arc::clone(target);
            match group.submit(move |target: Arc<S>| (i, op(&*target)), target) {
                Ok(()) => submitted[i] = true,
                Err(e) => errors.push(ShardBenchError::shard(i, e)),
            }
        }

        let collected = group.wait(self.config.shard_timeout);
        let timed_out = collected.timed_out;
        let elapsed = collected.elapsed;

        let mut responded = vec![false; targets.len()];
        let mut outputs = Vec::with_capacity(collected.results.len());
        for (i, result) in collected.results {
            responded[i] = true;
            match result {
                Ok(output) => outputs.push(output),
                Err(e) => errors.push(ShardBenchError::shard(i, e)),
            }
        }

        for i in 0..targets.len() {
            if submitted[i] && !responded[i] {
                let error = if timed_out {
                    ShardBenchError::timeout("shard did not respond", elapsed)
                } else {
                    ShardBenchError::task_lost("shard read ended without a result")
                };
                errors.push(ShardBenchError::shard(i, error));
            }
        }

        errors.sort_by_key(|e| e.shard_index());
        for error in &errors {
            warn!("{}: {error}", self.name);
        }

        FanOut {
            outputs,
            errors,
            timed_out,
        }
    }

    /// Write one sub-batch per shard concurrently, one thread per non-empty batch.
    ///
    /// Every write is attempted; the lowest-index failure is returned.
    fn fan_out_writes<T, F>(&self, batches: Vec<Vec<T>>, write: F) -> Result<()>
    where
        T: Send,
        F: Fn(usize, Vec<T>) -> Result<()> + Sync,
    {
        let write = &write;
        let mut outcomes: Vec<(usize, Result<()>)> = thread::scope(|s| {
            let mut handles = Vec::new();
            let mut outcomes = Vec::new();

            for (i, batch) in batches.into_iter().enumerate() {
                if batch.is_empty() {
                    continue;
                }
                let spawned = thread::Builder::new()
                    .name(format!("shardbench-writer-{i}"))
                    .spawn_scoped(s, move || write(i, batch));
                match spawned {
                    Ok(handle) => handles.push((i, handle)),
                    Err(e) => outcomes.push((i, Err(ShardBenchError::from(e)))),
                }
            }

            for (i, handle) in handles {
                let outcome = handle
                    .join()
                    .unwrap_or_else(|_| Err(ShardBenchError::internal("shard writer panicked")));
                outcomes.push((i, outcome));
            }
            outcomes
        });

        outcomes.sort_by_key(|(i, _)| *i);

        let mut first_error = None;
        for (i, outcome) in outcomes {
            if let Err(e) = outcome {
                warn!("{}: write to shard {i} failed: {e}", self.name);
                if first_error.is_none() {
                    first_error = Some(ShardBenchError::shard(i, e));
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Index for DistributedIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self) -> Result<()> {
        for (i, shard) in self.shards.iter().enumerate() {
            shard.create().map_err(|e| ShardBenchError::shard(i, e))?;
        }
        Ok(())
    }

    fn drop_index(&self) -> Result<()> {
        for (i, shard) in self.shards.iter().enumerate() {
            shard.drop_index().map_err(|e| ShardBenchError::shard(i, e))?;
        }
        Ok(())
    }

    fn index(&self, documents: Vec<Document>, options: &IndexingOptions) -> Result<()> {
        options.validate()?;

        let batches = split_by_key(self.partitioner.as_ref(), documents, |d| d.id())?;
        self.fan_out_writes(batches, |i, batch| self.shards[i].index(batch, options))
    }

    fn search(&self, query: &Query) -> Result<SearchResults> {
        self.search_partial(query).into_result()
    }

    fn document_count(&self) -> Result<u64> {
        let mut total = 0;
        for (i, shard) in self.shards.iter().enumerate() {
            total += shard
                .document_count()
                .map_err(|e| ShardBenchError::shard(i, e))?;
        }
        Ok(total)
    }
}

impl Autocompleter for DistributedIndex {
    fn add_terms(&self, suggestions: &[Suggestion]) -> Result<()> {
        let batches = split_by_key(self.partitioner.as_ref(), suggestions.to_vec(), |s| {
            s.term.as_str()
        })?;
        self.fan_out_writes(batches, |i, batch| self.autocompleters[i].add_terms(&batch))
    }

    fn suggest(&self, prefix: &str, count: usize, fuzzy: bool) -> Result<Vec<Suggestion>> {
        let partial = self.suggest_partial(prefix, count, fuzzy);
        if partial.suggestions.is_empty() {
            if let Some(error) = partial.errors.into_iter().next() {
                return Err(error);
            }
        }
        Ok(partial.suggestions)
    }

    fn delete(&self) -> Result<()> {
        for (i, ac) in self.autocompleters.iter().enumerate() {
            ac.delete().map_err(|e| ShardBenchError::shard(i, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::flags::QueryFlags;

    fn test_index(partitions: usize) -> DistributedIndex {
        let config = DistributedIndexConfig::new(partitions).with_pool_workers(partitions * 2);
        let index = DistributedIndex::in_memory("test", Metadata::wikipedia(), config).unwrap();
        index.create().unwrap();
        index
    }

    fn scored_docs(n: usize) -> Vec<Document> {
        (0..n)
            .map(|i| {
                Document::new(format!("doc{i}"), (i as f32) / (n as f32))
                    .set("title", format!("hello number {i}"))
            })
            .collect()
    }

    #[test]
    fn test_shard_count_mismatch() {
        let shards: Vec<Arc<dyn Index>> = vec![Arc::new(MemoryIndex::new("a", Metadata::new()))];
        let acs: Vec<Arc<dyn Autocompleter>> = vec![Arc::new(MemoryAutocompleter::new("a"))];

        let result = DistributedIndex::with_modulo(
            "test",
            shards,
            acs,
            DistributedIndexConfig::new(2).with_pool_workers(2),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_documents_land_on_their_partition() {
        let index = test_index(3);
        index
            .index(scored_docs(60), &IndexingOptions::default())
            .unwrap();

        assert_eq!(index.document_count().unwrap(), 60);

        for i in 0..60 {
            let id = format!("doc{i}");
            let owner = index.partitioner().partition_for(&id);
            for shard in 0..index.partitions() {
                let query = Query::new(i.to_string()).with_field("title");
                let found = index.shard(shard).unwrap().search(&query).unwrap();
                let present = found.documents.iter().any(|d| d.id() == id);
                assert_eq!(present, shard == owner, "{id} on shard {shard}");
            }
        }
    }

    #[test]
    fn test_search_merges_globally() {
        let index = test_index(4);
        index
            .index(scored_docs(40), &IndexingOptions::default())
            .unwrap();

        let page = index.search(&Query::new("hello").limit(5, 5)).unwrap();
        assert_eq!(page.total, 40);

        let ids: Vec<&str> = page.documents.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["doc34", "doc33", "doc32", "doc31", "doc30"]);
    }

    #[test]
    fn test_search_offset_past_end_is_empty() {
        let index = test_index(2);
        index
            .index(scored_docs(5), &IndexingOptions::default())
            .unwrap();

        let page = index.search(&Query::new("hello").limit(50, 10)).unwrap();
        assert!(page.documents.is_empty());
        assert_eq!(page.total, 5);
    }

    #[test]
    fn test_prefix_flag_reaches_shards() {
        let index = test_index(2);
        index
            .index(scored_docs(10), &IndexingOptions::default())
            .unwrap();

        let query = Query::new("hel").with_flags(QueryFlags::PREFIX);
        assert_eq!(index.search(&query).unwrap().total, 10);
        assert_eq!(index.search(&Query::new("hel")).unwrap().total, 0);
    }

    #[test]
    fn test_create_twice_reports_shard() {
        let index = test_index(2);
        let err = index.create().unwrap_err();
        assert_eq!(err.shard_index(), Some(0));
    }

    #[test]
    fn test_duplicate_write_error_names_lowest_shard() {
        let index = test_index(4);
        let docs = scored_docs(20);
        index.index(docs.clone(), &IndexingOptions::default()).unwrap();

        let lowest = (0..20)
            .map(|i| index.partitioner().partition_for(&format!("doc{i}")))
            .min();
        let err = index.index(docs, &IndexingOptions::default()).unwrap_err();
        assert_eq!(err.shard_index(), lowest);

        index.index(scored_docs(20), &IndexingOptions::replacing()).unwrap();
        assert_eq!(index.document_count().unwrap(), 20);
    }

    #[test]
    fn test_suggest_merges_and_truncates() {
        let index = test_index(3);
        let terms: Vec<Suggestion> = (0..12)
            .map(|i| Suggestion::new(format!("term{i}"), i as f64))
            .collect();
        index.add_terms(&terms).unwrap();

        let found = index.suggest("term", 3, false).unwrap();
        let names: Vec<&str> = found.iter().map(|s| s.term.as_str()).collect();
        assert_eq!(names, vec!["term11", "term10", "term9"]);

        assert!(index.suggest("nothing", 3, false).unwrap().is_empty());

        index.delete().unwrap();
        assert!(index.suggest("term", 3, false).unwrap().is_empty());
    }

    #[test]
    fn test_metrics_recorded() {
        let index = test_index(2);
        index.search(&Query::new("x")).unwrap();
        index.suggest("x", 5, false).unwrap();

        let metrics = index.metrics();
        assert_eq!(metrics.total_searches, 1);
        assert_eq!(metrics.total_suggests, 1);
        assert_eq!(metrics.failed_requests, 0);

        index.reset_metrics();
        assert_eq!(index.metrics().total_searches, 0);
    }

    #[test]
    fn test_search_after_shutdown_fails() {
        let index = test_index(2);
        index.shutdown();

        let partial = index.search_partial(&Query::new("hello"));
        assert_eq!(partial.errors.len(), 2);
        assert!(index.search(&Query::new("hello")).is_err());
    }
}
