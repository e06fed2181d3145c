use std::sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use crate::{autosave::AutosaveTarget, document::Document, error::DocumentError};

/// State shared between the UI thread and the autosave worker.
///
/// The UI locks `document` only for in-memory edits. Saves copy the
/// document under that lock and write the copy while holding `save_lock`.
#[derive(Debug)]
pub struct SessionContext {
    document: Mutex<Document>,
    save_lock: Mutex<()>,
    autosave_enabled: AtomicBool,
}

impl SessionContext {
    pub fn new(document: Document, autosave_enabled: bool) -> Self {
        Self {
            document: Mutex::new(document),
            save_lock: Mutex::new(()),
            autosave_enabled: AtomicBool::new(autosave_enabled),
        }
    }

    pub fn document(&self) -> MutexGuard<'_, Document> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Explicit save, serialized with autosave ticks.
    pub fn save(&self) -> Result<(), DocumentError> {
        let _guard = self
            .save_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.persist()
    }

    pub fn reload(&self) -> Result<(), DocumentError> {
        self.document().reload_from_file()
    }
}

impl AutosaveTarget for SessionContext {
    fn autosave_enabled(&self) -> bool {
        self.autosave_enabled.load(Ordering::SeqCst)
    }

    fn disable_autosave(&self) {
        self.autosave_enabled.store(false, Ordering::SeqCst);
    }

    fn save_lock(&self) -> &Mutex<()> {
        &self.save_lock
    }

    fn persist(&self) -> Result<(), DocumentError> {
        let snapshot = self.document().snapshot();
        snapshot.write()
    }
}
