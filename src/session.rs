//! The editing session.
//!
//! [`Session`] owns one [`SessionStore`], the [`StateMachine`], the display
//! options, the ingestion pool, the compositor and the target surface. Its
//! public methods are the five user actions:
//!
//! | Action | Method |
//! |---|---|
//! | load, replacing the filmstrip | [`Session::load_replace`] |
//! | load, appending to it | [`Session::load_append`] |
//! | select a photo | [`Session::select_photo`] |
//! | change a display option | [`Session::set_option`] |
//! | export the current frame | [`Session::export_current`] |
//!
//! A load only starts the batch. The owning thread then drains it with
//! [`Session::pump`] (non-blocking) or [`Session::wait`] (blocking); each
//! finished file is appended to the store as soon as every file before it
//! has finished, so the filmstrip fills in submission order. Only one batch
//! runs at a time: loading while a batch is in flight fails with
//! [`SessionError::BatchInFlight`].

use crate::compositor::{Compositor, Frame, Layout, RenderError};
use crate::config::{MatConfig, effective_threads};
use crate::export::{ExportError, ExportReceipt, SaveTarget, export_surface};
use crate::imaging::{ImageBackend, Quality, RustBackend, Surface, SurfaceError};
use crate::ingest::{Batch, FileOutcome, IngestError, Ingestor, WorkingCanvas};
use crate::state::{Action, SessionEvent, SessionState, StateMachine, TransitionError};
use crate::store::SessionStore;
use crate::types::{DisplayOption, DisplayOptions, SourceFile};
use serde::Serialize;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("a batch is already loading")]
    BatchInFlight,
    #[error("cannot {action} while {state}")]
    ActionUnavailable {
        action: Action,
        state: SessionState,
    },
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("invalid state change: {0}")]
    Transition(#[from] TransitionError),
    #[error("failed to start ingestion workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),
}

/// How a loaded batch combines with the photos already in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    Replace,
    Append,
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadMode::Replace => f.write_str("replace"),
            LoadMode::Append => f.write_str("append"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No files were given; nothing changed.
    Ignored,
    Started { files: usize },
}

/// Outcome of one file of a finished batch.
#[derive(Debug)]
pub struct FileReport {
    pub index: usize,
    pub name: String,
    /// Fitted raster size on success.
    pub result: Result<(u32, u32), IngestError>,
}

/// Summary of a finished batch, files in submission order.
#[derive(Debug)]
pub struct BatchReport {
    pub mode: LoadMode,
    pub files: Vec<FileReport>,
    /// Records in the store once the batch finished.
    pub store_len: usize,
}

impl BatchReport {
    pub fn loaded(&self) -> usize {
        self.files.iter().filter(|f| f.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.loaded()
    }
}

struct InFlight {
    batch: Batch,
    mode: LoadMode,
    files: Vec<FileReport>,
}

pub struct Session<B: ImageBackend + 'static = RustBackend> {
    store: Rc<SessionStore>,
    machine: StateMachine,
    options: DisplayOptions,
    ingestor: Ingestor<B>,
    compositor: Compositor,
    surface: Surface,
    export_quality: Quality,
    in_flight: Option<InFlight>,
}

impl Session<RustBackend> {
    /// Session decoding with the built-in backend.
    pub fn from_config(config: &MatConfig) -> Result<Self, SessionError> {
        Self::with_backend(Arc::new(RustBackend::new()), config)
    }
}

impl<B: ImageBackend + 'static> Session<B> {
    pub fn with_backend(backend: Arc<B>, config: &MatConfig) -> Result<Self, SessionError> {
        let threads = effective_threads(&config.processing);
        let ingestor = Ingestor::new(backend, WorkingCanvas::from_config(config), threads)?;
        let compositor = Compositor::new(Layout::from_config(config));
        let surface = compositor.new_surface()?;
        debug!(threads, "session ready");

        Ok(Self {
            store: Rc::new(SessionStore::new()),
            machine: StateMachine::new(),
            options: DisplayOptions::default(),
            ingestor,
            compositor,
            surface,
            export_quality: Quality::new(config.export.quality),
            in_flight: None,
        })
    }

    pub fn store(&self) -> &Rc<SessionStore> {
        &self.store
    }

    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    pub fn options(&self) -> &DisplayOptions {
        &self.options
    }

    /// The target surface, holding the last rendered frame.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn layout(&self) -> &Layout {
        self.compositor.layout()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    fn require(&self, action: Action) -> Result<(), SessionError> {
        if self.machine.allows(action) {
            Ok(())
        } else {
            Err(SessionError::ActionUnavailable {
                action,
                state: self.machine.state(),
            })
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Replace the filmstrip with `files`. The store is cleared right away
    /// and refills as files finish.
    pub fn load_replace(&mut self, files: Vec<SourceFile>) -> Result<LoadOutcome, SessionError> {
        self.load(files, LoadMode::Replace)
    }

    /// Add `files` after the photos already loaded.
    pub fn load_append(&mut self, files: Vec<SourceFile>) -> Result<LoadOutcome, SessionError> {
        self.load(files, LoadMode::Append)
    }

    pub fn load(
        &mut self,
        files: Vec<SourceFile>,
        mode: LoadMode,
    ) -> Result<LoadOutcome, SessionError> {
        if self.in_flight.is_some() {
            return Err(SessionError::BatchInFlight);
        }
        self.require(Action::Load)?;
        if files.is_empty() {
            debug!(%mode, "empty batch ignored");
            return Ok(LoadOutcome::Ignored);
        }

        self.machine.fire(SessionEvent::BatchSubmitted)?;
        if mode == LoadMode::Replace {
            self.store.replace_all(Vec::new());
        }

        let count = files.len();
        info!(files = count, %mode, "batch submitted");
        self.in_flight = Some(InFlight {
            batch: self.ingestor.spawn_batch(files),
            mode,
            files: Vec::with_capacity(count),
        });
        Ok(LoadOutcome::Started { files: count })
    }

    /// Publish whatever has finished without blocking. Returns the report
    /// once the batch is complete.
    pub fn pump(&mut self) -> Option<BatchReport> {
        let flight = self.in_flight.as_mut()?;
        while let Some(outcome) = flight.batch.try_next() {
            publish(&self.store, &mut flight.files, outcome);
        }
        if flight.batch.is_complete() {
            self.finish_batch()
        } else {
            None
        }
    }

    /// Block until the batch in flight is complete. `None` if nothing was
    /// loading.
    pub fn wait(&mut self) -> Option<BatchReport> {
        let flight = self.in_flight.as_mut()?;
        while let Some(outcome) = flight.batch.next_blocking() {
            publish(&self.store, &mut flight.files, outcome);
        }
        self.finish_batch()
    }

    fn finish_batch(&mut self) -> Option<BatchReport> {
        let flight = self.in_flight.take()?;
        let has_photos = !self.store.is_empty();
        if let Err(e) = self.machine.fire(SessionEvent::BatchFinished { has_photos }) {
            warn!(error = %e, "batch finished outside of loading");
        }

        let report = BatchReport {
            mode: flight.mode,
            files: flight.files,
            store_len: self.store.len(),
        };
        info!(
            loaded = report.loaded(),
            failed = report.failed(),
            total = report.store_len,
            "batch finished"
        );
        Some(report)
    }

    // =========================================================================
    // Editing
    // =========================================================================

    pub fn select_photo(&mut self, index: usize) -> Result<(), SessionError> {
        self.require(Action::SelectPhoto)?;
        self.store.select(index);
        Ok(())
    }

    pub fn set_option(&mut self, option: DisplayOption) -> Result<(), SessionError> {
        self.require(Action::SetOption)?;
        self.options.apply(option);
        debug!(?option, "display option changed");
        Ok(())
    }

    /// Render the selected photo onto the session surface. `None` when no
    /// photo is loaded.
    pub fn render_current(&mut self) -> Result<Option<Frame>, SessionError> {
        let Some(photo) = self.store.selected() else {
            return Ok(None);
        };
        let frame = self
            .compositor
            .render(&mut self.surface, &photo, &self.options)?;
        Ok(Some(frame))
    }

    /// Render the selected photo and save it through `target`.
    ///
    /// The session passes through `Saving` and is back in `Editing`
    /// afterwards, whether or not the export worked.
    pub fn export_current(
        &mut self,
        target: &mut impl SaveTarget,
    ) -> Result<ExportReceipt, SessionError> {
        self.require(Action::Export)?;
        let Some(photo) = self.store.selected() else {
            return Err(SessionError::ActionUnavailable {
                action: Action::Export,
                state: self.machine.state(),
            });
        };

        self.machine.fire(SessionEvent::ExportRequested)?;
        let result = self
            .compositor
            .render(&mut self.surface, &photo, &self.options)
            .map_err(ExportError::from)
            .and_then(|_| {
                export_surface(&self.surface, &photo.name(), self.export_quality, target)
            });
        self.machine.fire(SessionEvent::ExportFinished)?;

        match result {
            Ok(receipt) => {
                info!(photo = %photo.name(), path = %receipt.path.display(), "exported");
                Ok(receipt)
            }
            Err(e) => {
                warn!(photo = %photo.name(), error = %e, "export failed");
                Err(e.into())
            }
        }
    }
}

fn publish(store: &SessionStore, files: &mut Vec<FileReport>, outcome: FileOutcome) {
    let FileOutcome {
        index,
        name,
        result,
    } = outcome;
    let result = match result {
        Ok(record) => {
            let size = (record.width(), record.height());
            info!(file = %name, width = size.0, height = size.1, "loaded");
            store.append(vec![record]);
            Ok(size)
        }
        Err(e) => {
            warn!(file = %name, error = %e, "skipped");
            Err(e)
        }
    };
    files.push(FileReport {
        index,
        name,
        result,
    });
}
