//! Habit Session
//!
//! The explicit context for the list being edited: its passcode, its habits,
//! where it came from, and the mirror it is persisted to. Every mutation is
//! written to the mirror before it becomes visible in memory; the mirror is
//! only cleared after the remote store confirmed a save or delete. A fresh
//! draft's passcode is mirrored as soon as it is drawn.

use std::sync::Arc;

use crate::domain::{DomainError, DomainResult, Habit, HabitList, Passcode, SessionView, TimeOfDay};
use crate::repository::{ListOrigin, LocalMirror, RemoteStore};

pub struct HabitSession {
    passcode: Passcode,
    habits: HabitList,
    origin: ListOrigin,
    mirror: Arc<dyn LocalMirror>,
}

impl HabitSession {
    fn draft(mirror: Arc<dyn LocalMirror>) -> Self {
        Self {
            passcode: Passcode::generate(),
            habits: HabitList::new(),
            origin: ListOrigin::Draft,
            mirror,
        }
    }

    /// Empty draft under a freshly drawn passcode, mirrored right away so the
    /// passcode survives a restart
    pub fn new_draft(mirror: Arc<dyn LocalMirror>) -> DomainResult<Self> {
        let session = Self::draft(mirror);
        session.persist()?;
        Ok(session)
    }

    /// Resume the mirrored session, or start a draft if there is none. An
    /// unreadable mirror is replaced by a fresh draft.
    pub fn restore(mirror: Arc<dyn LocalMirror>) -> Self {
        match mirror.load() {
            Ok(Some(snapshot)) => {
                log::info!(
                    "Restored {} habits for {} from local mirror",
                    snapshot.habits.len(),
                    snapshot.passcode
                );
                return Self {
                    passcode: snapshot.passcode,
                    habits: snapshot.habits,
                    origin: snapshot.origin,
                    mirror,
                };
            }
            Ok(None) => {}
            Err(e) => log::error!("Discarding unreadable local list: {}", e),
        }

        let session = Self::draft(mirror);
        if let Err(e) = session.persist() {
            log::warn!("Could not store passcode {} locally: {}", session.passcode, e);
        }
        session
    }

    /// Replace this session with the remote list stored under `passcode`.
    /// Refused while this session holds habits the remote store has not
    /// seen. On any error nothing local changes.
    pub async fn open(&mut self, remote: &dyn RemoteStore, passcode: Passcode) -> DomainResult<()> {
        self.ensure_synced(remote).await?;
        let habits = remote.fetch(&passcode).await?;
        self.mirror.save(&habits, &passcode, ListOrigin::Remote)?;
        self.passcode = passcode;
        self.habits = habits;
        self.origin = ListOrigin::Remote;
        Ok(())
    }

    async fn ensure_synced(&self, remote: &dyn RemoteStore) -> DomainResult<()> {
        let unsynced = match self.origin {
            ListOrigin::Draft => !self.habits.is_empty(),
            ListOrigin::Remote => match remote.fetch(&self.passcode).await {
                Ok(stored) => stored != self.habits,
                Err(e) => {
                    log::warn!("Could not compare {} with the remote copy: {}", self.passcode, e);
                    true
                }
            },
        };
        if unsynced {
            return Err(DomainError::Validation(format!(
                "List {} has changes that are not saved remotely; save it or start a new list first",
                self.passcode
            )));
        }
        Ok(())
    }

    pub fn passcode(&self) -> &Passcode {
        &self.passcode
    }

    pub fn habits(&self) -> &HabitList {
        &self.habits
    }

    pub fn origin(&self) -> ListOrigin {
        self.origin
    }

    pub fn view(&self) -> SessionView {
        self.habits.grouped()
    }

    pub fn sorted(&self) -> Vec<Habit> {
        self.habits.sorted_by_time()
    }

    fn mutate<T>(&mut self, op: impl FnOnce(&mut HabitList) -> DomainResult<T>) -> DomainResult<T> {
        let mut next = self.habits.clone();
        let out = op(&mut next)?;
        self.mirror.save(&next, &self.passcode, self.origin)?;
        self.habits = next;
        Ok(out)
    }

    pub fn add(&mut self, description: &str, time: TimeOfDay) -> DomainResult<Habit> {
        self.mutate(|habits| habits.add(description, time).cloned())
    }

    pub fn edit(&mut self, id: i64, description: &str, time: TimeOfDay) -> DomainResult<Habit> {
        self.mutate(|habits| habits.edit(id, description, time).cloned())
    }

    pub fn delete(&mut self, id: i64) -> DomainResult<Habit> {
        self.mutate(|habits| habits.delete(id))
    }

    pub fn toggle(&mut self, id: i64) -> DomainResult<Habit> {
        self.mutate(|habits| habits.toggle(id).cloned())
    }

    /// Push the whole list: `create` for drafts, `replace` for opened lists.
    /// On success the mirror is cleared and the session starts over as an
    /// empty draft; on failure nothing local changes.
    pub async fn save(&mut self, remote: &dyn RemoteStore) -> DomainResult<Passcode> {
        let passcode = match self.origin {
            ListOrigin::Draft => self.create_remote(remote).await?,
            ListOrigin::Remote => {
                remote.replace(&self.passcode, &self.habits).await?;
                self.passcode.clone()
            }
        };
        self.finish();
        Ok(passcode)
    }

    async fn create_remote(&mut self, remote: &dyn RemoteStore) -> DomainResult<Passcode> {
        let passcode = remote.claim_passcode(Some(self.passcode.clone())).await?;
        if passcode != self.passcode {
            log::warn!("Passcode {} is taken, saving under {}", self.passcode, passcode);
            self.mirror.save(&self.habits, &passcode, self.origin)?;
            self.passcode = passcode.clone();
        }

        match remote.create_at(&passcode, &self.habits).await {
            Ok(()) => Ok(passcode),
            // The POST may have landed. Look before telling the user to retry.
            Err(DomainError::Unconfirmed { passcode: code, reason }) => {
                match remote.is_taken(&passcode).await {
                    Ok(true) => {
                        log::info!("Create for {} confirmed by follow-up fetch", passcode);
                        Ok(passcode)
                    }
                    Ok(false) => Err(DomainError::Remote(format!("Saving habits failed: {}", reason))),
                    Err(e) => {
                        log::warn!("Could not confirm create for {}: {}", passcode, e);
                        Err(DomainError::Unconfirmed { passcode: code, reason })
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Delete the remote record, then the mirror
    pub async fn delete_remote(&mut self, remote: &dyn RemoteStore) -> DomainResult<()> {
        if self.origin == ListOrigin::Draft {
            return Err(DomainError::Validation(
                "This list has not been saved yet, there is nothing to delete remotely".to_string(),
            ));
        }
        remote.remove(&self.passcode).await?;
        self.finish();
        Ok(())
    }

    /// Drop the local list without touching the remote store and start an
    /// empty draft under a fresh passcode
    pub fn discard(&mut self) -> DomainResult<()> {
        self.mirror.clear()?;
        self.reset();
        self.persist()
    }

    fn persist(&self) -> DomainResult<()> {
        self.mirror.save(&self.habits, &self.passcode, self.origin)
    }

    fn finish(&mut self) {
        // The remote side already succeeded; a stale mirror only means the
        // same list is offered again on next start.
        if let Err(e) = self.mirror.clear() {
            log::error!("Remote sync succeeded but clearing the local mirror failed: {}", e);
        }
        self.reset();
        if let Err(e) = self.persist() {
            log::warn!("Could not store passcode {} locally: {}", self.passcode, e);
        }
    }

    fn reset(&mut self) {
        self.passcode = Passcode::generate();
        self.habits = HabitList::new();
        self.origin = ListOrigin::Draft;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{
        MemoryStorage, Storage, StorageMirror, StorageWrite, HABITS_KEY, HABIT_DATA_KEY, PASSCODE_KEY,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// In-memory remote with switchable failure modes
    #[derive(Default)]
    struct FakeRemote {
        records: Mutex<HashMap<String, HabitList>>,
        fail_writes: AtomicBool,
        /// Store the create, then report a lost response
        ambiguous_create: AtomicBool,
        /// Drop the create, then report a lost response
        lost_create: AtomicBool,
    }

    impl FakeRemote {
        fn record(&self, passcode: &Passcode) -> Option<HabitList> {
            self.records.lock().unwrap().get(passcode.as_str()).cloned()
        }

        fn insert(&self, passcode: &str, habits: HabitList) {
            self.records.lock().unwrap().insert(passcode.to_string(), habits);
        }

        fn refuse_writes(&self) -> DomainResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(DomainError::Remote("503 Service Unavailable".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RemoteStore for FakeRemote {
        async fn create_at(&self, passcode: &Passcode, habits: &HabitList) -> DomainResult<()> {
            self.refuse_writes()?;
            let unconfirmed = DomainError::Unconfirmed {
                passcode: passcode.to_string(),
                reason: "timed out".to_string(),
            };
            if self.lost_create.load(Ordering::SeqCst) {
                return Err(unconfirmed);
            }
            self.insert(passcode.as_str(), habits.clone());
            if self.ambiguous_create.load(Ordering::SeqCst) {
                return Err(unconfirmed);
            }
            Ok(())
        }

        async fn fetch(&self, passcode: &Passcode) -> DomainResult<HabitList> {
            self.record(passcode)
                .ok_or_else(|| DomainError::NotFound(passcode.to_string()))
        }

        async fn replace(&self, passcode: &Passcode, habits: &HabitList) -> DomainResult<()> {
            self.refuse_writes()?;
            self.insert(passcode.as_str(), habits.clone());
            Ok(())
        }

        async fn remove(&self, passcode: &Passcode) -> DomainResult<()> {
            self.refuse_writes()?;
            match self.records.lock().unwrap().remove(passcode.as_str()) {
                Some(_) => Ok(()),
                None => Err(DomainError::Remote("404 Not Found".to_string())),
            }
        }
    }

    fn setup() -> (Arc<dyn LocalMirror>, MemoryStorage) {
        let storage = MemoryStorage::new();
        (Arc::new(StorageMirror::new(storage.clone())), storage)
    }

    fn stored_list() -> HabitList {
        let mut list = HabitList::new();
        list.add("Stretch", TimeOfDay::Morning).unwrap();
        list.add("Journal", TimeOfDay::Evening).unwrap();
        list
    }

    /// The mirror holds nothing but an empty draft under `session`'s passcode
    fn assert_fresh_draft(mirror: &Arc<dyn LocalMirror>, session: &HabitSession) {
        let snapshot = mirror.load().unwrap().unwrap();
        assert!(snapshot.habits.is_empty());
        assert_eq!(snapshot.origin, ListOrigin::Draft);
        assert_eq!(&snapshot.passcode, session.passcode());
        assert_eq!(session.origin(), ListOrigin::Draft);
        assert!(session.habits().is_empty());
    }

    #[test]
    fn test_restore_without_mirror_stores_new_passcode() {
        let (mirror, storage) = setup();
        let session = HabitSession::restore(mirror.clone());
        assert_fresh_draft(&mirror, &session);
        assert_eq!(
            storage.get(PASSCODE_KEY).unwrap().as_deref(),
            Some(session.passcode().as_str())
        );

        let again = HabitSession::restore(mirror);
        assert_eq!(again.passcode(), session.passcode());
    }

    #[test]
    fn test_restore_replaces_unreadable_mirror() {
        let (mirror, storage) = setup();
        storage
            .apply(vec![StorageWrite::Set(HABIT_DATA_KEY.to_string(), "{oops".to_string())])
            .unwrap();

        let mut session = HabitSession::restore(mirror.clone());
        assert_fresh_draft(&mirror, &session);
        assert!(storage.get(HABIT_DATA_KEY).unwrap().is_none());

        session.add("Drink water", TimeOfDay::Morning).unwrap();
        assert_eq!(mirror.load().unwrap().unwrap().habits.len(), 1);
    }

    #[test]
    fn test_every_mutation_is_mirrored() {
        let (mirror, _) = setup();
        let mut session = HabitSession::new_draft(mirror.clone()).unwrap();
        let water = session.add("Drink water", TimeOfDay::Morning).unwrap();
        session.add("Walk", TimeOfDay::Afternoon).unwrap();
        session.toggle(water.id).unwrap();

        let restored = HabitSession::restore(mirror.clone());
        assert_eq!(restored.passcode(), session.passcode());
        assert_eq!(restored.habits(), session.habits());
        assert!(restored.habits().find(water.id).unwrap().completed);

        session.delete(water.id).unwrap();
        let restored = HabitSession::restore(mirror);
        assert_eq!(restored.habits().len(), 1);
    }

    #[test]
    fn test_invalid_mutation_leaves_mirror_alone() {
        let (mirror, _) = setup();
        let mut session = HabitSession::new_draft(mirror.clone()).unwrap();
        let before = mirror.load().unwrap();
        assert!(matches!(
            session.add("", TimeOfDay::Morning),
            Err(DomainError::Validation(_))
        ));
        assert!(session.toggle(42).is_err());
        assert_eq!(mirror.load().unwrap(), before);
    }

    #[test]
    fn test_discard_starts_new_passcode() {
        let (mirror, _) = setup();
        let mut session = HabitSession::new_draft(mirror.clone()).unwrap();
        session.add("Drink water", TimeOfDay::Morning).unwrap();
        let old = session.passcode().clone();

        session.discard().unwrap();
        assert_ne!(session.passcode(), &old);
        assert_fresh_draft(&mirror, &session);
    }

    #[tokio::test]
    async fn test_save_draft_creates_and_clears_mirror() {
        let (mirror, _) = setup();
        let remote = FakeRemote::default();
        let mut session = HabitSession::new_draft(mirror.clone()).unwrap();
        session.add("Drink water", TimeOfDay::Morning).unwrap();
        let drafted = session.passcode().clone();

        let saved = session.save(&remote).await.unwrap();
        assert_eq!(saved, drafted);
        let stored = remote.record(&saved).unwrap();
        assert_eq!(stored.as_slice()[0].description, "Drink water");
        assert_ne!(session.passcode(), &saved);
        assert_fresh_draft(&mirror, &session);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_local_state() {
        let (mirror, _) = setup();
        let remote = FakeRemote::default();
        remote.fail_writes.store(true, Ordering::SeqCst);
        let mut session = HabitSession::new_draft(mirror.clone()).unwrap();
        session.add("Drink water", TimeOfDay::Morning).unwrap();
        let before = mirror.load().unwrap().unwrap();

        let err = session.save(&remote).await.unwrap_err();
        assert!(matches!(err, DomainError::Remote(_)));
        assert_eq!(mirror.load().unwrap().unwrap(), before);
        assert_eq!(session.habits().len(), 1);
    }

    #[tokio::test]
    async fn test_taken_draft_passcode_is_redrawn() {
        let (mirror, _) = setup();
        let remote = FakeRemote::default();
        let mut session = HabitSession::new_draft(mirror).unwrap();
        session.add("Drink water", TimeOfDay::Morning).unwrap();
        let drafted = session.passcode().clone();
        let existing = stored_list();
        remote.insert(drafted.as_str(), existing.clone());

        let saved = session.save(&remote).await.unwrap();
        assert_ne!(saved, drafted);
        assert_eq!(remote.record(&drafted).unwrap(), existing);
        assert_eq!(remote.record(&saved).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ambiguous_create_confirmed_by_fetch() {
        let (mirror, _) = setup();
        let remote = FakeRemote::default();
        remote.ambiguous_create.store(true, Ordering::SeqCst);
        let mut session = HabitSession::new_draft(mirror.clone()).unwrap();
        session.add("Drink water", TimeOfDay::Morning).unwrap();

        let saved = session.save(&remote).await.unwrap();
        assert!(remote.record(&saved).is_some());
        assert_fresh_draft(&mirror, &session);
    }

    #[tokio::test]
    async fn test_lost_create_reports_error_and_keeps_mirror() {
        let (mirror, _) = setup();
        let remote = FakeRemote::default();
        remote.lost_create.store(true, Ordering::SeqCst);
        let mut session = HabitSession::new_draft(mirror.clone()).unwrap();
        session.add("Drink water", TimeOfDay::Morning).unwrap();

        let err = session.save(&remote).await.unwrap_err();
        assert!(matches!(err, DomainError::Remote(_)));
        assert_eq!(mirror.load().unwrap().unwrap().habits.len(), 1);
    }

    #[tokio::test]
    async fn test_open_unknown_passcode_leaves_mirror() {
        let (mirror, storage) = setup();
        let remote = FakeRemote::default();
        let mut session = HabitSession::new_draft(mirror).unwrap();
        let drafted = session.passcode().clone();
        let keys_before = storage.keys();

        let result = session.open(&remote, Passcode::parse("000000").unwrap()).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
        assert_eq!(storage.keys(), keys_before);
        assert_eq!(session.passcode(), &drafted);
    }

    #[tokio::test]
    async fn test_open_refused_while_draft_has_habits() {
        let (mirror, storage) = setup();
        let remote = FakeRemote::default();
        let existing = stored_list();
        remote.insert("482913", existing.clone());
        let mut session = HabitSession::new_draft(mirror.clone()).unwrap();
        session.add("Unsynced", TimeOfDay::Evening).unwrap();
        let draft_slot = storage.get(HABITS_KEY).unwrap();

        let result = session.open(&remote, Passcode::parse("482913").unwrap()).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(storage.get(HABITS_KEY).unwrap(), draft_slot);
        assert_eq!(session.habits().as_slice()[0].description, "Unsynced");

        session.discard().unwrap();
        session.open(&remote, Passcode::parse("482913").unwrap()).await.unwrap();
        assert_eq!(session.habits(), &existing);
    }

    #[tokio::test]
    async fn test_open_refused_while_opened_list_has_edits() {
        let (mirror, _) = setup();
        let remote = FakeRemote::default();
        remote.insert("482913", stored_list());
        remote.insert("111111", HabitList::new());
        let mut session = HabitSession::new_draft(mirror.clone()).unwrap();
        session.open(&remote, Passcode::parse("482913").unwrap()).await.unwrap();

        // Unchanged since opening, so switching is fine
        session.open(&remote, Passcode::parse("111111").unwrap()).await.unwrap();
        session.add("Floss", TimeOfDay::Evening).unwrap();

        let result = session.open(&remote, Passcode::parse("482913").unwrap()).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
        let snapshot = mirror.load().unwrap().unwrap();
        assert_eq!(snapshot.passcode.as_str(), "111111");
        assert_eq!(snapshot.habits.len(), 1);
    }

    #[tokio::test]
    async fn test_open_edit_and_replace() {
        let (mirror, _) = setup();
        let remote = FakeRemote::default();
        remote.insert("482913", stored_list());

        let passcode = Passcode::parse("482913").unwrap();
        let mut session = HabitSession::new_draft(mirror.clone()).unwrap();
        session.open(&remote, passcode.clone()).await.unwrap();
        assert_eq!(session.origin(), ListOrigin::Remote);
        assert_eq!(mirror.load().unwrap().unwrap().origin, ListOrigin::Remote);

        let ids: Vec<i64> = session.habits().iter().map(|h| h.id).collect();
        for id in ids {
            session.delete(id).unwrap();
        }
        let snapshot = mirror.load().unwrap().unwrap();
        assert_eq!(snapshot.origin, ListOrigin::Remote);
        assert!(snapshot.habits.is_empty());

        let saved = session.save(&remote).await.unwrap();
        assert_eq!(saved, passcode);
        assert!(remote.record(&passcode).unwrap().is_empty());
        assert_fresh_draft(&mirror, &session);
    }

    #[tokio::test]
    async fn test_failed_remote_delete_keeps_mirror() {
        let (mirror, _) = setup();
        let remote = FakeRemote::default();
        remote.insert("482913", stored_list());
        let mut session = HabitSession::new_draft(mirror.clone()).unwrap();
        session.open(&remote, Passcode::parse("482913").unwrap()).await.unwrap();
        remote.records.lock().unwrap().clear();

        assert!(matches!(
            session.delete_remote(&remote).await,
            Err(DomainError::Remote(_))
        ));
        let snapshot = mirror.load().unwrap().unwrap();
        assert_eq!(snapshot.origin, ListOrigin::Remote);
        assert_eq!(snapshot.habits.len(), 2);
        assert_eq!(session.habits().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_remote_clears_everything() {
        let (mirror, _) = setup();
        let remote = FakeRemote::default();
        remote.insert("482913", stored_list());
        let passcode = Passcode::parse("482913").unwrap();
        let mut session = HabitSession::new_draft(mirror.clone()).unwrap();
        session.open(&remote, passcode.clone()).await.unwrap();

        session.delete_remote(&remote).await.unwrap();
        assert!(remote.record(&passcode).is_none());
        assert_ne!(session.passcode(), &passcode);
        assert_fresh_draft(&mirror, &session);
    }

    #[tokio::test]
    async fn test_delete_remote_refused_for_draft() {
        let (mirror, _) = setup();
        let remote = FakeRemote::default();
        let mut session = HabitSession::new_draft(mirror).unwrap();
        assert!(matches!(
            session.delete_remote(&remote).await,
            Err(DomainError::Validation(_))
        ));
    }
}
