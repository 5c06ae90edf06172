//! Buffer pool manager: a bounded, pinnable cache of pages keyed by
//! `(table, page_id)` sitting between [`storage::FileManager`] and anything
//! that needs page-level access (the storage engine, ultimately the
//! executor). Callers pin a page while they hold a reference to it and
//! unpin it when done; eviction only ever considers unpinned frames.


pub mod policy;

use common::{Config, DbError, ReplacementPolicyKind};
use hashbrown::HashMap;
use policy::{FifoPolicy, LruPolicy, ReplacementPolicy};
use storage::{FileManager, Page};

fn storage_err(kind: &'static str, message: impl Into<String>) -> DbError {
    DbError::Storage {
        kind,
        message: message.into(),
    }
}

type FrameKey = (String, u32);

struct Frame {
    key: FrameKey,
    page: Page,
    pin_count: u32,
    dirty: bool,
}

/// A handle to a pinned page. Cheap to copy; does not itself borrow the
/// pool, so callers pass it back into [`BufferPool::page`]/[`BufferPool::page_mut`]
/// or [`BufferPool::unpin`] rather than dereferencing it directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageHandle {
    frame_id: usize,
}

/// Point-in-time counters for [`BufferPool::stats`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub policy: &'static str,
}

impl PoolStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// A bounded, pinnable cache of pages backed by a [`FileManager`].
pub struct BufferPool {
    file_manager: FileManager,
    frames: Vec<Option<Frame>>,
    index: HashMap<FrameKey, usize>,
    capacity: usize,
    policy: Box<dyn ReplacementPolicy>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl BufferPool {
    pub fn new(file_manager: FileManager, capacity: usize, policy_kind: ReplacementPolicyKind) -> Self {
        let policy: Box<dyn ReplacementPolicy> = match policy_kind {
            ReplacementPolicyKind::Lru => Box::new(LruPolicy::default()),
            ReplacementPolicyKind::Fifo => Box::new(FifoPolicy::default()),
        };
        Self {
            file_manager,
            frames: Vec::new(),
            index: HashMap::new(),
            capacity,
            policy,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let file_manager = FileManager::new(config.data_dir.clone());
        Self::new(file_manager, config.buffer_pool_pages, config.replacement_policy)
    }

    fn unpinned_frame_ids(&self) -> Vec<usize> {
        self.frames
            .iter()
            .enumerate()
            .filter_map(|(id, f)| match f {
                Some(frame) if frame.pin_count == 0 => Some(id),
                _ => None,
            })
            .collect()
    }

    fn evict_one(&mut self) -> Result<usize, DbError> {
        let unpinned = self.unpinned_frame_ids();
        let victim = self
            .policy
            .pick_victim(&unpinned)
            .ok_or_else(|| storage_err("BufferFull", "no unpinned frame available to evict"))?;

        let frame = self.frames[victim].take().expect("victim frame must be occupied");
        if frame.dirty {
            self.file_manager
                .write_page(&frame.key.0, frame.key.1, &frame.page)?;
        }
        self.index.remove(&frame.key);
        self.policy.forget(victim);
        self.evictions += 1;
        log::debug!("evicted frame {victim} for {:?} (dirty={})", frame.key, frame.dirty);
        Ok(victim)
    }

    fn allocate_frame_slot(&mut self) -> Result<usize, DbError> {
        if self.frames.len() < self.capacity {
            self.frames.push(None);
            Ok(self.frames.len() - 1)
        } else {
            self.evict_one()
        }
    }

    /// Pins and returns a handle to `(table, page_id)`, loading it from disk
    /// on a miss.
    pub fn get(&mut self, table: &str, page_id: u32) -> Result<PageHandle, DbError> {
        let key = (table.to_string(), page_id);
        if let Some(&frame_id) = self.index.get(&key) {
            let frame = self.frames[frame_id].as_mut().expect("indexed frame must be occupied");
            frame.pin_count += 1;
            self.policy.record_access(frame_id);
            self.hits += 1;
            return Ok(PageHandle { frame_id });
        }

        self.misses += 1;
        let page = self.file_manager.read_page(table, page_id)?;
        let frame_id = self.allocate_frame_slot()?;
        self.frames[frame_id] = Some(Frame {
            key: key.clone(),
            page,
            pin_count: 1,
            dirty: false,
        });
        self.index.insert(key, frame_id);
        self.policy.record_access(frame_id);
        Ok(PageHandle { frame_id })
    }

    /// Allocates a fresh page in `table`, pins it, and returns both its id
    /// and a handle. The frame starts dirty since the page only exists in
    /// memory until flushed.
    pub fn new_page(&mut self, table: &str) -> Result<(u32, PageHandle), DbError> {
        let page_id = self.file_manager.allocate_page(table)?;
        let key = (table.to_string(), page_id);
        let frame_id = self.allocate_frame_slot()?;
        self.frames[frame_id] = Some(Frame {
            key: key.clone(),
            page: Page::new(page_id),
            pin_count: 1,
            dirty: true,
        });
        self.index.insert(key, frame_id);
        self.policy.record_access(frame_id);
        Ok((page_id, PageHandle { frame_id }))
    }

    pub fn unpin(&mut self, handle: PageHandle) {
        if let Some(frame) = self.frames[handle.frame_id].as_mut() {
            frame.pin_count = frame.pin_count.saturating_sub(1);
        }
    }

    pub fn page(&self, handle: PageHandle) -> &Page {
        &self.frames[handle.frame_id].as_ref().expect("handle refers to a live frame").page
    }

    pub fn page_mut(&mut self, handle: PageHandle) -> &mut Page {
        let frame = self.frames[handle.frame_id]
            .as_mut()
            .expect("handle refers to a live frame");
        frame.dirty = true;
        &mut frame.page
    }

    /// Writes every dirty frame back to disk and fsyncs the touched files.
    pub fn flush_all(&mut self) -> Result<(), DbError> {
        let mut touched_tables = Vec::new();
        for frame in self.frames.iter_mut().flatten() {
            if frame.dirty {
                self.file_manager
                    .write_page(&frame.key.0, frame.key.1, &frame.page)?;
                frame.dirty = false;
                if !touched_tables.contains(&frame.key.0) {
                    touched_tables.push(frame.key.0.clone());
                }
            }
        }
        for table in touched_tables {
            self.file_manager.flush(&table)?;
        }
        Ok(())
    }

    /// Number of pages currently allocated for `table`, including ones not
    /// presently cached.
    pub fn page_count(&mut self, table: &str) -> Result<u32, DbError> {
        self.file_manager.page_count(table)
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            policy: self.policy.name(),
        }
    }
}
