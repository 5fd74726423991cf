//! Observable, ordered collection of ingested photos.
//!
//! [`SessionStore`] holds the filmstrip (records in insertion order) and the
//! selected index. It lives on one thread and is shared by reference; all
//! mutation goes through `&self` methods backed by `RefCell`.
//!
//! ## Notification contract
//!
//! Every mutation (`replace_all`, `append`, `select`) calls every subscribed
//! listener synchronously, with no arguments, before returning. Listeners read
//! the new state through [`SessionStore::snapshot`]. The listener list is
//! captured when a notification starts, so:
//!
//! - a listener subscribed during a notification first runs on the next one;
//! - a listener unsubscribed during a notification still runs in that pass if
//!   it had not been reached yet.
//!
//! No store borrow is held while listeners run, so they may read the store or
//! even mutate it (which starts a nested notification).

use crate::types::PhotoRecord;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener = Rc<dyn Fn()>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

#[derive(Default)]
struct StoreState {
    records: Vec<Rc<PhotoRecord>>,
    selected_index: usize,
}

/// Point-in-time view of the store.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub records: Vec<Rc<PhotoRecord>>,
    pub selected_index: usize,
}

impl StoreSnapshot {
    pub fn selected(&self) -> Option<&Rc<PhotoRecord>> {
        self.records.get(self.selected_index)
    }
}

#[derive(Default)]
pub struct SessionStore {
    state: RefCell<StoreState>,
    listeners: Rc<RefCell<Registry>>,
}

/// Handle returned by [`SessionStore::subscribe`].
///
/// Dropping it leaves the listener registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .borrow_mut()
                .entries
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every record and reset the selection to 0.
    pub fn replace_all(&self, records: Vec<PhotoRecord>) {
        {
            let mut state = self.state.borrow_mut();
            state.records = records.into_iter().map(Rc::new).collect();
            state.selected_index = 0;
        }
        self.notify();
    }

    /// Add records at the end; the selection is untouched.
    pub fn append(&self, records: Vec<PhotoRecord>) {
        self.state
            .borrow_mut()
            .records
            .extend(records.into_iter().map(Rc::new));
        self.notify();
    }

    /// Select `index`, clamped into range. On an empty store the selection is 0.
    pub fn select(&self, index: usize) {
        {
            let mut state = self.state.borrow_mut();
            let last = state.records.len().saturating_sub(1);
            state.selected_index = index.min(last);
        }
        self.notify();
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.borrow();
        StoreSnapshot {
            records: state.records.clone(),
            selected_index: state.selected_index,
        }
    }

    pub fn len(&self) -> usize {
        self.state.borrow().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().records.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.state.borrow().selected_index
    }

    pub fn selected(&self) -> Option<Rc<PhotoRecord>> {
        let state = self.state.borrow();
        state.records.get(state.selected_index).cloned()
    }

    /// Register `listener` for every future mutation.
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Subscription {
        let mut registry = self.listeners.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, Rc::new(listener)));
        Subscription {
            registry: Rc::downgrade(&self.listeners),
            id,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }

    fn notify(&self) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .entries
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ExposureInfo;
    use crate::types::SourceFile;
    use std::cell::Cell;
    use tiny_skia::Pixmap;

    fn record(name: &str) -> PhotoRecord {
        PhotoRecord::new(
            SourceFile::from_bytes(name, Vec::<u8>::new()),
            Vec::new(),
            Pixmap::new(4, 3).unwrap(),
            ExposureInfo::default(),
        )
    }

    fn names(store: &SessionStore) -> Vec<String> {
        store.snapshot().records.iter().map(|r| r.name()).collect()
    }

    fn counter(store: &SessionStore) -> (Rc<Cell<u32>>, Subscription) {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let sub = store.subscribe(move || seen.set(seen.get() + 1));
        (count, sub)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    #[test]
    fn replace_all_resets_selection() {
        let store = SessionStore::new();
        store.replace_all(vec![record("x"), record("y"), record("z")]);
        store.select(2);
        store.replace_all(vec![record("a"), record("b")]);
        assert_eq!(store.selected_index(), 0);
        assert_eq!(names(&store), ["a", "b"]);
    }

    #[test]
    fn append_keeps_selection_and_order() {
        let store = SessionStore::new();
        store.replace_all(vec![record("a"), record("b")]);
        store.select(1);
        store.append(vec![record("c")]);
        assert_eq!(store.selected_index(), 1);
        assert_eq!(names(&store), ["a", "b", "c"]);
    }

    #[test]
    fn select_clamps_into_range() {
        let store = SessionStore::new();
        store.replace_all(vec![record("a"), record("b")]);
        store.select(10);
        assert_eq!(store.selected_index(), 1);
        assert_eq!(store.selected().map(|r| r.name()).as_deref(), Some("b"));
    }

    #[test]
    fn select_on_empty_store_records_zero() {
        let store = SessionStore::new();
        store.select(3);
        assert_eq!(store.selected_index(), 0);
        assert!(store.selected().is_none());
        assert!(store.snapshot().selected().is_none());
    }

    #[test]
    fn snapshot_is_unaffected_by_later_mutation() {
        let store = SessionStore::new();
        store.replace_all(vec![record("a")]);
        let before = store.snapshot();
        store.append(vec![record("b")]);
        assert_eq!(before.records.len(), 1);
        assert_eq!(store.len(), 2);
    }

    // =========================================================================
    // Notification
    // =========================================================================

    #[test]
    fn each_listener_runs_once_per_mutation() {
        let store = SessionStore::new();
        let (first, _a) = counter(&store);
        let (second, _b) = counter(&store);

        store.replace_all(vec![record("a")]);
        assert_eq!((first.get(), second.get()), (1, 1));

        store.append(vec![record("b")]);
        store.select(1);
        assert_eq!((first.get(), second.get()), (3, 3));
    }

    #[test]
    fn listeners_see_new_state() {
        let store = Rc::new(SessionStore::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (reader, log) = (Rc::downgrade(&store), Rc::clone(&seen));
        let _sub = store.subscribe(move || {
            if let Some(store) = reader.upgrade() {
                log.borrow_mut().push(store.len());
            }
        });

        store.replace_all(vec![record("a"), record("b")]);
        store.append(vec![record("c")]);
        assert_eq!(*seen.borrow(), vec![2, 3]);
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let store = SessionStore::new();
        let (count, sub) = counter(&store);
        sub.unsubscribe();
        store.append(vec![record("a")]);
        assert_eq!(count.get(), 0);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn listener_added_during_notification_waits_for_next_pass() {
        let store = Rc::new(SessionStore::new());
        let late_calls = Rc::new(Cell::new(0));
        let added = Rc::new(Cell::new(false));

        let handle = Rc::downgrade(&store);
        let (calls, flag) = (Rc::clone(&late_calls), Rc::clone(&added));
        let _sub = store.subscribe(move || {
            if flag.replace(true) {
                return;
            }
            if let Some(store) = handle.upgrade() {
                let calls = Rc::clone(&calls);
                // Dropping the handle keeps the listener registered.
                let _ = store.subscribe(move || calls.set(calls.get() + 1));
            }
        });

        store.append(vec![record("a")]);
        assert_eq!(late_calls.get(), 0);
        store.append(vec![record("b")]);
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn listener_removed_during_notification_still_runs_that_pass() {
        let store = SessionStore::new();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let slot = Rc::clone(&victim);
        let _remover = store.subscribe(move || {
            if let Some(sub) = slot.borrow_mut().take() {
                sub.unsubscribe();
            }
        });
        let (count, sub) = counter(&store);
        *victim.borrow_mut() = Some(sub);

        store.append(vec![record("a")]);
        assert_eq!(count.get(), 1);
        store.append(vec![record("b")]);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn listener_may_mutate_store() {
        let store = Rc::new(SessionStore::new());
        let handle = Rc::downgrade(&store);
        let _sub = store.subscribe(move || {
            if let Some(store) = handle.upgrade() {
                if store.selected_index() != store.len().saturating_sub(1) {
                    store.select(usize::MAX);
                }
            }
        });

        store.replace_all(vec![record("a"), record("b"), record("c")]);
        assert_eq!(store.selected_index(), 2);
    }
}
