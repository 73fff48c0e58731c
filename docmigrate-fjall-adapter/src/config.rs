use fjall::{CompressionType, Config, PartitionCreateOptions};
use docmigrate::common::{atomic, Atomic, ReadExecutor, WriteExecutor};
use docmigrate::errors::{ErrorKind, MigrateError, MigrateResult};
use std::sync::atomic::{AtomicBool, AtomicI8, AtomicU16, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Smallest journal size fjall accepts.
pub const MIN_JOURNALING_SIZE: u64 = 24 * 1_024 * 1_024;

/// Smallest write buffer fjall accepts.
pub const MIN_WRITE_BUFFER_SIZE: u64 = 1_024 * 1_024;

#[derive(Clone)]
/// Fjall keyspace configuration for a [`FjallVersionStore`](crate::FjallVersionStore).
///
/// A cloneable, thread-safe holder of the fjall tuning parameters. Uses the
/// PIMPL pattern with `Arc<FjallConfigInner>`; every clone shares the same
/// settings and each parameter is an atomic.
///
/// Usage: configure through [`FjallVersionStore::with_config`](crate::FjallVersionStore::with_config)
/// and its builder methods, then `build()` the store.
pub struct FjallConfig {
    inner: Arc<FjallConfigInner>,
}

impl Default for FjallConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FjallConfig {
    /// Creates a configuration with default values.
    ///
    /// Version histories are small, so the defaults are modest:
    /// - Block cache: 16 MB
    /// - Write buffer: 32 MB
    /// - Max journaling size: 64 MB
    /// - Bloom filter: 10 bits per key
    /// - Compression: LZ4
    /// - Flush and compaction workers: 1 each
    /// - Every insert is synced to disk
    #[inline]
    pub fn new() -> FjallConfig {
        FjallConfig {
            inner: Arc::new(FjallConfigInner::new()),
        }
    }

    /// Checks the values fjall would otherwise reject with a panic.
    pub(crate) fn validate(&self) -> MigrateResult<()> {
        if self.db_path().trim().is_empty() {
            return Err(MigrateError::new(
                "Fjall db path is not set",
                ErrorKind::ValidationError,
            ));
        }

        let journaling_size = self.max_journaling_size();
        if journaling_size < MIN_JOURNALING_SIZE {
            return Err(MigrateError::new(
                &format!(
                    "Max journaling size {} is below the minimum of {} bytes",
                    journaling_size, MIN_JOURNALING_SIZE
                ),
                ErrorKind::ValidationError,
            ));
        }

        let write_buffer_size = self.max_write_buffer_size();
        if write_buffer_size < MIN_WRITE_BUFFER_SIZE {
            return Err(MigrateError::new(
                &format!(
                    "Max write buffer size {} is below the minimum of {} bytes",
                    write_buffer_size, MIN_WRITE_BUFFER_SIZE
                ),
                ErrorKind::ValidationError,
            ));
        }
        Ok(())
    }

    /// Builds the fjall keyspace configuration.
    #[inline]
    pub(crate) fn keyspace_config(&self) -> Config {
        let mut config = Config::new(self.inner.db_path());
        config = config
            .manual_journal_persist(self.inner.manual_journal_persist.load(Ordering::Relaxed))
            .flush_workers(self.inner.flush_workers_count.load(Ordering::Relaxed))
            .compaction_workers(self.inner.compaction_workers_count.load(Ordering::Relaxed))
            .cache_size(self.inner.block_cache_capacity.load(Ordering::Relaxed))
            .max_journaling_size(self.inner.max_journaling_size.load(Ordering::Relaxed))
            .max_write_buffer_size(self.inner.max_write_buffer_size.load(Ordering::Relaxed));

        let fsync_frequency = self.inner.fsync_frequency.load(Ordering::Relaxed);
        if fsync_frequency > 0 {
            config = config.fsync_ms(Some(fsync_frequency));
        }
        config
    }

    /// Builds the options used for every history partition.
    #[inline]
    pub(crate) fn partition_config(&self) -> PartitionCreateOptions {
        let bloom_filter_bits = self.inner.bloom_filter_bits.load(Ordering::Relaxed);
        PartitionCreateOptions::default()
            .bloom_filter_bits(if bloom_filter_bits < 0 {
                None
            } else {
                Some(bloom_filter_bits as u8)
            })
            .compression(self.compression_type())
            .block_size(self.inner.block_size.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn db_path(&self) -> &str {
        self.inner.db_path()
    }

    /// Sets the keyspace directory. Only the first call takes effect.
    #[inline]
    pub(crate) fn set_db_path(&self, db_path: &str) {
        self.inner.db_path.get_or_init(|| db_path.to_string());
    }

    #[inline]
    pub fn manual_journal_persist(&self) -> bool {
        self.inner.manual_journal_persist.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_manual_journal_persist(&self, v: bool) {
        self.inner.manual_journal_persist.store(v, Ordering::Relaxed);
    }

    #[inline]
    pub fn flush_workers(&self) -> usize {
        self.inner.flush_workers_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_flush_workers(&self, c: usize) {
        self.inner.flush_workers_count.store(c, Ordering::Relaxed);
    }

    #[inline]
    pub fn compaction_workers(&self) -> usize {
        self.inner.compaction_workers_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_compaction_workers(&self, c: usize) {
        self.inner.compaction_workers_count.store(c, Ordering::Relaxed);
    }

    #[inline]
    pub fn block_cache_capacity(&self) -> u64 {
        self.inner.block_cache_capacity.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_block_cache_capacity(&self, c: u64) {
        self.inner.block_cache_capacity.store(c, Ordering::Relaxed);
    }

    #[inline]
    pub fn max_journaling_size(&self) -> u64 {
        self.inner.max_journaling_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_max_journaling_size(&self, s: u64) {
        self.inner.max_journaling_size.store(s, Ordering::Relaxed);
    }

    #[inline]
    pub fn max_write_buffer_size(&self) -> u64 {
        self.inner.max_write_buffer_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_max_write_buffer_size(&self, s: u64) {
        self.inner.max_write_buffer_size.store(s, Ordering::Relaxed);
    }

    /// Background fsync interval in milliseconds, 0 when disabled.
    #[inline]
    pub fn fsync_frequency(&self) -> u16 {
        self.inner.fsync_frequency.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_fsync_frequency(&self, f: u16) {
        self.inner.fsync_frequency.store(f, Ordering::Relaxed);
    }

    /// Whether every insert is followed by a full journal sync.
    #[inline]
    pub fn sync_on_insert(&self) -> bool {
        self.inner.sync_on_insert.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_sync_on_insert(&self, v: bool) {
        self.inner.sync_on_insert.store(v, Ordering::Relaxed);
    }

    #[inline]
    pub fn bloom_filter_bits(&self) -> i8 {
        self.inner.bloom_filter_bits.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_bloom_filter_bits(&self, b: i8) {
        self.inner.bloom_filter_bits.store(b, Ordering::Relaxed);
    }

    #[inline]
    pub fn compression_type(&self) -> CompressionType {
        self.inner.compression_type.read_with(|it| it.clone())
    }

    #[inline]
    pub(crate) fn set_compression_type(&self, ct: CompressionType) {
        self.inner.compression_type.write_with(|c| *c = ct);
    }

    #[inline]
    pub fn block_size(&self) -> u32 {
        self.inner.block_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_block_size(&self, s: u32) {
        self.inner.block_size.store(s, Ordering::Relaxed);
    }
}

struct FjallConfigInner {
    db_path: OnceLock<String>,
    manual_journal_persist: AtomicBool,
    flush_workers_count: AtomicUsize,
    compaction_workers_count: AtomicUsize,
    block_cache_capacity: AtomicU64,
    max_journaling_size: AtomicU64,
    max_write_buffer_size: AtomicU64,
    fsync_frequency: AtomicU16,
    sync_on_insert: AtomicBool,
    bloom_filter_bits: AtomicI8,
    compression_type: Atomic<CompressionType>,
    block_size: AtomicU32,
}

impl FjallConfigInner {
    pub const DEFAULT_BLOCK_CACHE_MB: u64 = 16;

    pub const DEFAULT_WRITE_BUFFER_MB: u64 = 32;

    pub const DEFAULT_MAX_JOURNALING_MB: u64 = 64;

    fn new() -> FjallConfigInner {
        FjallConfigInner {
            db_path: OnceLock::new(),
            manual_journal_persist: AtomicBool::new(false),
            flush_workers_count: AtomicUsize::new(1),
            compaction_workers_count: AtomicUsize::new(1),
            block_cache_capacity: AtomicU64::new(Self::DEFAULT_BLOCK_CACHE_MB * 1_024 * 1_024),
            max_journaling_size: AtomicU64::new(Self::DEFAULT_MAX_JOURNALING_MB * 1_024 * 1_024),
            max_write_buffer_size: AtomicU64::new(Self::DEFAULT_WRITE_BUFFER_MB * 1_024 * 1_024),
            fsync_frequency: AtomicU16::new(0),
            sync_on_insert: AtomicBool::new(true),
            bloom_filter_bits: AtomicI8::new(10),
            compression_type: atomic(CompressionType::Lz4),
            block_size: AtomicU32::new(4 * 1_024),
        }
    }

    #[inline]
    fn db_path(&self) -> &str {
        self.db_path.get().map(|path| path.as_str()).unwrap_or("")
    }
}
