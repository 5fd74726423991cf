//! Photo ingestion: source file → [`PhotoRecord`].
//!
//! ## Per-file steps
//!
//! 1. Read the raw bytes.
//! 2. Decode camera tags. Failure is not an error: the photo simply has no
//!    exposure metadata.
//! 3. Decode the raster. Failure rejects this file only.
//! 4. Fit the raster inside the working canvas and resample it to exactly the
//!    fitted size. Zero-sized sources are rejected here, before any fit math.
//! 5. Encode the fitted raster as the JPEG preview.
//!
//! ## Batches
//!
//! [`Ingestor::spawn_batch`] runs files on a private rayon pool, started in
//! input order, and streams [`FileOutcome`]s back over an mpsc channel. The
//! returned [`Batch`] releases outcomes strictly in input order no matter
//! which worker finishes first, so whoever drains it can publish records in
//! submission order. With one worker thread the batch is fully sequential.
//!
//! If a worker dies without reporting (a panicking decoder, say), the files
//! it owed are reported as [`IngestError::WorkerLost`] once the channel
//! closes, so a batch always completes.

use crate::config::MatConfig;
use crate::imaging::{
    BackendError, ImageBackend, Margins, Quality, SurfaceError, aspect_ratio, compute_fit,
    operations, raster_size,
};
use crate::metadata::ExposureInfo;
use crate::types::{PhotoRecord, SourceFile};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: BackendError,
    },
    #[error("{name} has unusable dimensions {width}x{height}")]
    InvalidDimensions {
        name: String,
        width: u32,
        height: u32,
    },
    #[error("failed to encode preview of {name}: {source}")]
    Encode {
        name: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to rasterise {name}: {source}")]
    Surface {
        name: String,
        #[source]
        source: SurfaceError,
    },
    #[error("{name} was not processed: ingestion worker stopped")]
    WorkerLost { name: String },
}

/// Canvas every source is pre-fitted into at ingestion time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkingCanvas {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub preview_quality: Quality,
}

impl WorkingCanvas {
    pub fn from_config(config: &MatConfig) -> Self {
        Self {
            width: config.working.width as f32,
            height: config.working.height as f32,
            margin: config.working.margin as f32,
            preview_quality: Quality::new(config.export.thumbnail_quality),
        }
    }
}

impl Default for WorkingCanvas {
    fn default() -> Self {
        Self::from_config(&MatConfig::default())
    }
}

/// Ingest one file.
pub fn ingest<B: ImageBackend + ?Sized>(
    backend: &B,
    file: &SourceFile,
    canvas: &WorkingCanvas,
) -> Result<PhotoRecord, IngestError> {
    let name = file.name();
    let bytes = file.read().map_err(|source| IngestError::Read {
        name: name.clone(),
        source,
    })?;

    let metadata = match backend.read_tags(&bytes) {
        Ok(tags) => ExposureInfo::from_tags(&tags),
        Err(e) => {
            debug!(file = %name, error = %e, "no exposure metadata");
            ExposureInfo::default()
        }
    };

    let decoded = backend.decode(&bytes).map_err(|source| IngestError::Decode {
        name: name.clone(),
        source,
    })?;
    let (natural_w, natural_h) = (decoded.width(), decoded.height());
    let aspect = aspect_ratio(natural_w, natural_h).ok_or_else(|| IngestError::InvalidDimensions {
        name: name.clone(),
        width: natural_w,
        height: natural_h,
    })?;

    let placement = compute_fit(
        canvas.width,
        canvas.height,
        &Margins::uniform(canvas.margin),
        aspect,
    );
    let (width, height) = raster_size(&placement);
    let raster =
        operations::fit_raster(&decoded, width, height).map_err(|source| IngestError::Surface {
            name: name.clone(),
            source,
        })?;
    let display_jpeg = operations::encode_jpeg(&raster, canvas.preview_quality).map_err(|source| {
        IngestError::Encode {
            name: name.clone(),
            source,
        }
    })?;

    debug!(
        file = %name,
        natural = %format!("{natural_w}x{natural_h}"),
        fitted = %format!("{width}x{height}"),
        "ingested"
    );
    Ok(PhotoRecord::new(file.clone(), display_jpeg, raster, metadata))
}

/// Result of ingesting the file at `index` of its batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub index: usize,
    pub name: String,
    pub result: Result<PhotoRecord, IngestError>,
}

/// Reorder buffer: accepts items tagged with their input position in any
/// order and releases them in position order.
#[derive(Debug)]
pub struct OrderedResults<T> {
    next: usize,
    pending: BTreeMap<usize, T>,
}

impl<T> OrderedResults<T> {
    pub fn new() -> Self {
        Self {
            next: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Position of the next item to be released.
    pub fn next_index(&self) -> usize {
        self.next
    }

    /// Whether `index` was already accepted (released or waiting).
    pub fn contains(&self, index: usize) -> bool {
        index < self.next || self.pending.contains_key(&index)
    }

    /// Accept `item` at `index` and return every item that is now due, in
    /// order. Duplicates and already-released positions are dropped.
    pub fn push(&mut self, index: usize, item: T) -> Vec<T> {
        if index < self.next {
            return Vec::new();
        }
        self.pending.entry(index).or_insert(item);

        let mut due = Vec::new();
        while let Some(item) = self.pending.remove(&self.next) {
            due.push(item);
            self.next += 1;
        }
        due
    }
}

impl<T> Default for OrderedResults<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs batches of files on a private worker pool.
pub struct Ingestor<B: ImageBackend + 'static> {
    backend: Arc<B>,
    canvas: WorkingCanvas,
    pool: rayon::ThreadPool,
}

impl<B: ImageBackend + 'static> Ingestor<B> {
    pub fn new(
        backend: Arc<B>,
        canvas: WorkingCanvas,
        threads: usize,
    ) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("ingest-{i}"))
            .panic_handler(|_| error!("ingestion worker panicked"))
            .build()?;
        Ok(Self {
            backend,
            canvas,
            pool,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn canvas(&self) -> &WorkingCanvas {
        &self.canvas
    }

    /// Start ingesting `files`; outcomes are collected through the returned
    /// [`Batch`].
    pub fn spawn_batch(&self, files: Vec<SourceFile>) -> Batch {
        let (tx, rx) = mpsc::channel();
        let names: Vec<String> = files.iter().map(SourceFile::name).collect();

        for (index, file) in files.into_iter().enumerate() {
            let tx = tx.clone();
            let backend = Arc::clone(&self.backend);
            let canvas = self.canvas;
            self.pool.spawn_fifo(move || {
                let result = ingest(backend.as_ref(), &file, &canvas);
                // The receiver only goes away when the batch is abandoned.
                let _ = tx.send(FileOutcome {
                    index,
                    name: file.name(),
                    result,
                });
            });
        }

        Batch {
            rx,
            names,
            order: OrderedResults::new(),
            ready: VecDeque::new(),
        }
    }
}

/// An in-flight batch, drained on the owning thread.
pub struct Batch {
    rx: Receiver<FileOutcome>,
    names: Vec<String>,
    order: OrderedResults<FileOutcome>,
    ready: VecDeque<FileOutcome>,
}

impl Batch {
    /// Number of files in the batch.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// True once every outcome has been handed out.
    pub fn is_complete(&self) -> bool {
        self.all_released() && self.ready.is_empty()
    }

    fn all_released(&self) -> bool {
        self.order.next_index() >= self.names.len()
    }

    fn accept(&mut self, outcome: FileOutcome) {
        let index = outcome.index;
        self.ready.extend(self.order.push(index, outcome));
    }

    /// Channel closed early: every file not yet reported is lost.
    fn fail_missing(&mut self) {
        for index in self.order.next_index()..self.names.len() {
            if self.order.contains(index) {
                continue;
            }
            let name = self.names[index].clone();
            warn!(file = %name, "ingestion worker exited without a result");
            self.accept(FileOutcome {
                index,
                name: name.clone(),
                result: Err(IngestError::WorkerLost { name }),
            });
        }
    }

    /// Next outcome in input order, if it has already arrived.
    pub fn try_next(&mut self) -> Option<FileOutcome> {
        loop {
            if let Some(outcome) = self.ready.pop_front() {
                return Some(outcome);
            }
            if self.all_released() {
                return None;
            }
            match self.rx.try_recv() {
                Ok(outcome) => self.accept(outcome),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => self.fail_missing(),
            }
        }
    }

    /// Next outcome in input order, waiting for it if necessary. `None` once
    /// the batch is complete.
    pub fn next_blocking(&mut self) -> Option<FileOutcome> {
        loop {
            if let Some(outcome) = self.ready.pop_front() {
                return Some(outcome);
            }
            if self.all_released() {
                return None;
            }
            match self.rx.recv() {
                Ok(outcome) => self.accept(outcome),
                Err(_) => self.fail_missing(),
            }
        }
    }
}
