//! One polling tick: scan, build a batch, reconcile it with the remote log.

use gc_base::ChangeBatch;
use gc_mod_git::{VersionControl, WorkingTreeScanner};
use gc_mod_github::{ContentApi, RemoteLogReconciler};

use super::scheduler::{Phase, PhaseTracker, TickOutcome, TickRunner};

pub struct Pipeline<V, A> {
    scanner: WorkingTreeScanner<V>,
    reconciler: RemoteLogReconciler<A>,
}

impl<V: VersionControl, A: ContentApi> Pipeline<V, A> {
    pub fn new(scanner: WorkingTreeScanner<V>, reconciler: RemoteLogReconciler<A>) -> Self {
        Self { scanner, reconciler }
    }
}

impl<V: VersionControl, A: ContentApi> TickRunner for Pipeline<V, A> {
    fn run_tick(&mut self, phase: &PhaseTracker) -> TickOutcome {
        // An unavailable tree is logged by the scanner and scans as clean
        phase.set(Phase::Scanning);
        let scan = self.scanner.scan();

        phase.set(Phase::Building);
        let Some(batch) = ChangeBatch::build(scan) else {
            return TickOutcome::Clean;
        };

        phase.set(Phase::Reconciling);
        match self.reconciler.reconcile(&batch) {
            Ok(outcome) => TickOutcome::Recorded(outcome),
            Err(e) => TickOutcome::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use gc_base::LineDelta;
    use gc_mod_git::{ScanError, StatusEntry, parse_numstat, parse_short_status};
    use gc_mod_github::table::TABLE_HEADER;
    use gc_mod_github::{ReconcileError, ReconcileOutcome, RemoteError, RemoteFile};

    use super::*;

    struct FakeVcs {
        status: RefCell<Option<String>>,
    }

    impl FakeVcs {
        fn new(status: Option<&str>) -> Self {
            Self { status: RefCell::new(status.map(str::to_string)) }
        }
    }

    impl VersionControl for FakeVcs {
        fn short_status(&self) -> Result<Vec<StatusEntry>, ScanError> {
            match self.status.borrow().as_deref() {
                Some(out) => Ok(parse_short_status(out)),
                None => Err(ScanError::Failed { code: "128".into(), stderr: "not a git repository".into() }),
            }
        }

        fn numstat(&self, _path: &str) -> LineDelta {
            parse_numstat("3\t1\tx")
        }
    }

    #[derive(Default)]
    struct FakeRepo {
        file: RefCell<Option<RemoteFile>>,
        reads: Cell<usize>,
        writes: Cell<usize>,
        conflict: Cell<bool>,
    }

    impl ContentApi for FakeRepo {
        fn read_file(&self, _path: &str) -> Result<Option<RemoteFile>, RemoteError> {
            self.reads.set(self.reads.get() + 1);
            Ok(self.file.borrow().clone())
        }

        fn create_file(&self, _path: &str, content: &[u8], _message: &str) -> Result<(), RemoteError> {
            self.writes.set(self.writes.get() + 1);
            *self.file.borrow_mut() = Some(RemoteFile { content: content.to_vec(), sha: "v1".into() });
            Ok(())
        }

        fn update_file(&self, _path: &str, content: &[u8], _sha: &str, _message: &str) -> Result<(), RemoteError> {
            self.writes.set(self.writes.get() + 1);
            if self.conflict.get() {
                return Err(RemoteError::Conflict);
            }
            *self.file.borrow_mut() = Some(RemoteFile { content: content.to_vec(), sha: "v2".into() });
            Ok(())
        }
    }

    fn pipeline<'a>(vcs: FakeVcs, repo: &'a FakeRepo) -> Pipeline<FakeVcs, &'a FakeRepo> {
        Pipeline::new(WorkingTreeScanner::new(vcs), RemoteLogReconciler::new(repo, "README.md"))
    }

    #[test]
    fn clean_tree_never_touches_the_remote() {
        let repo = FakeRepo::default();
        let mut p = pipeline(FakeVcs::new(Some("")), &repo);
        let phase = PhaseTracker::default();

        assert!(matches!(p.run_tick(&phase), TickOutcome::Clean));
        assert_eq!(repo.reads.get(), 0);
        assert_eq!(repo.writes.get(), 0);
    }

    #[test]
    fn unavailable_tree_never_touches_the_remote() {
        let repo = FakeRepo::default();
        let mut p = pipeline(FakeVcs::new(None), &repo);

        assert!(matches!(p.run_tick(&PhaseTracker::default()), TickOutcome::Clean));
        assert_eq!(repo.reads.get(), 0);
        assert_eq!(repo.writes.get(), 0);
    }

    #[test]
    fn changes_are_created_then_appended() {
        let repo = FakeRepo::default();
        let mut p = pipeline(FakeVcs::new(Some("?? new.txt\n M old.txt\n")), &repo);
        let phase = PhaseTracker::default();

        match p.run_tick(&phase) {
            TickOutcome::Recorded(ReconcileOutcome::Created { rows }) => assert_eq!(rows, 2),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(phase.get(), Phase::Reconciling);

        match p.run_tick(&phase) {
            TickOutcome::Recorded(ReconcileOutcome::Appended { rows, previous_rows }) => {
                assert_eq!((rows, previous_rows), (2, 2));
            }
            other => panic!("unexpected {:?}", other),
        }

        let body = String::from_utf8(repo.file.borrow().as_ref().unwrap().content.clone()).unwrap();
        assert_eq!(body.matches(TABLE_HEADER).count(), 1);
        assert_eq!(body.matches("| old.txt | +3 / -1 |").count(), 2);
    }

    #[test]
    fn conflict_surfaces_as_failed_tick() {
        let repo = FakeRepo::default();
        *repo.file.borrow_mut() = Some(RemoteFile { content: b"notes\n".to_vec(), sha: "v0".into() });
        repo.conflict.set(true);
        let mut p = pipeline(FakeVcs::new(Some("?? a\n")), &repo);

        assert!(matches!(p.run_tick(&PhaseTracker::default()), TickOutcome::Failed(ReconcileError::Conflict)));
        assert_eq!(repo.writes.get(), 1);
    }
}
