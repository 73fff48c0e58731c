use crate::config::{FjallConfig, MIN_JOURNALING_SIZE};
use crate::store::FjallVersionStore;
use docmigrate::errors::MigrateResult;
use fjall::CompressionType;

/// Builder for a [`FjallVersionStore`].
///
/// `FjallVersionStoreBuilder` provides a fluent API for the fjall keyspace
/// parameters and a couple of presets.
///
/// # Examples
///
/// ```rust,ignore
/// use docmigrate::migrator::Migrator;
/// use docmigrate_fjall_adapter::FjallVersionStore;
///
/// let store = FjallVersionStore::with_config()
///     .db_path("/var/lib/app/migrations")
///     .low_memory_preset()
///     .build()?;
///
/// let mut migrator = Migrator::builder().provider(store).build()?;
/// ```
pub struct FjallVersionStoreBuilder {
    store_config: FjallConfig,
}

impl Default for FjallVersionStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FjallVersionStoreBuilder {
    #[inline]
    pub fn new() -> FjallVersionStoreBuilder {
        FjallVersionStoreBuilder {
            store_config: FjallConfig::new(),
        }
    }

    /// Applies a preset for long running services.
    ///
    /// This configures:
    /// - 64 MB block cache
    /// - 64 MB write buffer
    /// - Half the CPU cores for flush and compaction workers
    /// - 100ms background fsync in addition to the per-insert sync
    #[inline]
    pub fn production_preset(self) -> Self {
        let cpus = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(4);

        self.block_cache_capacity(64 * 1024 * 1024)
            .max_write_buffer_size(64 * 1024 * 1024)
            .flush_workers((cpus / 2).max(1))
            .compaction_workers((cpus / 2).max(1))
            .fsync_frequency(100)
            .compression_type(CompressionType::Lz4)
    }

    /// Applies a preset for embedded and memory-constrained environments.
    #[inline]
    pub fn low_memory_preset(self) -> Self {
        self.block_cache_capacity(4 * 1024 * 1024)
            .max_write_buffer_size(8 * 1024 * 1024)
            .max_journaling_size(MIN_JOURNALING_SIZE)
            .flush_workers(1)
            .compaction_workers(1)
    }

    #[inline]
    pub fn db_path(self, db_path: &str) -> Self {
        self.store_config.set_db_path(db_path);
        self
    }

    #[inline]
    pub fn manual_journal_persist(self, manual_journal_persist: bool) -> Self {
        self.store_config
            .set_manual_journal_persist(manual_journal_persist);
        self
    }

    #[inline]
    pub fn flush_workers(self, flush_workers_count: usize) -> Self {
        self.store_config.set_flush_workers(flush_workers_count);
        self
    }

    #[inline]
    pub fn compaction_workers(self, compaction_workers_count: usize) -> Self {
        self.store_config
            .set_compaction_workers(compaction_workers_count);
        self
    }

    #[inline]
    pub fn block_cache_capacity(self, block_cache_capacity: u64) -> Self {
        self.store_config
            .set_block_cache_capacity(block_cache_capacity);
        self
    }

    #[inline]
    pub fn max_journaling_size(self, max_journaling_size: u64) -> Self {
        self.store_config.set_max_journaling_size(max_journaling_size);
        self
    }

    #[inline]
    pub fn max_write_buffer_size(self, max_write_buffer_size: u64) -> Self {
        self.store_config
            .set_max_write_buffer_size(max_write_buffer_size);
        self
    }

    #[inline]
    pub fn fsync_frequency(self, fsync_frequency: u16) -> Self {
        self.store_config.set_fsync_frequency(fsync_frequency);
        self
    }

    /// Turns the journal sync after every insert on or off.
    #[inline]
    pub fn sync_on_insert(self, sync_on_insert: bool) -> Self {
        self.store_config.set_sync_on_insert(sync_on_insert);
        self
    }

    /// Bits per key for partition bloom filters; values above 127 are
    /// clamped to 127.
    #[inline]
    pub fn bloom_filter_bits(self, bloom_filter_bits: u8) -> Self {
        let bits = i8::try_from(bloom_filter_bits).unwrap_or(i8::MAX);
        self.store_config.set_bloom_filter_bits(bits);
        self
    }

    #[inline]
    pub fn compression_type(self, compression_type: CompressionType) -> Self {
        self.store_config.set_compression_type(compression_type);
        self
    }

    #[inline]
    pub fn block_size(self, block_size: u32) -> Self {
        self.store_config.set_block_size(block_size);
        self
    }

    /// Opens the keyspace and returns the store.
    ///
    /// # Errors
    ///
    /// `ValidationError` when no db path was set or a buffer size is below
    /// fjall's minimum, `PersistenceError` when the keyspace cannot be opened.
    #[inline]
    pub fn build(self) -> MigrateResult<FjallVersionStore> {
        FjallVersionStore::open(self.store_config)
    }
}
