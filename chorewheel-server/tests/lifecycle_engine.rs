use chorewheel_server::lifecycle::{Engine, LifecycleError, SubmitRequest, reward};
use chorewheel_server::server::{FamilyConfig, UserConfig};
use chorewheel_server::storage::{ChoreDraft, Store};
use chorewheel_shared::auth::Role;
use chorewheel_shared::domain::{AssignmentStatus, ChoreStatus, RewardKind, SubmissionStatus};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use std::path::PathBuf;

struct TestFamily {
    store: Store,
    engine: Engine,
    family_id: i32,
    parent_id: i32,
    child_ids: Vec<i32>,
    db_path: PathBuf,
    _tempdir: tempfile::TempDir,
}

async fn setup(child_names: &[&str]) -> TestFamily {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let store = Store::connect_sqlite(db_path.to_str().unwrap())
        .await
        .expect("db");

    let mut users = vec![UserConfig {
        username: "pat".into(),
        display_name: "Pat".into(),
        password_hash: "$2b$12$not.a.real.hash".into(),
        role: Role::Parent,
    }];
    for name in child_names {
        users.push(UserConfig {
            username: (*name).into(),
            display_name: name.to_uppercase(),
            password_hash: "$2b$12$not.a.real.hash".into(),
            role: Role::Child,
        });
    }
    let family_id = store
        .seed_from_config(
            &FamilyConfig {
                name: "testers".into(),
            },
            &users,
        )
        .await
        .expect("seed");

    let parent_id = store
        .get_user_by_username("pat")
        .await
        .unwrap()
        .unwrap()
        .id;
    let mut child_ids = Vec::new();
    for name in child_names {
        child_ids.push(store.get_user_by_username(name).await.unwrap().unwrap().id);
    }

    let engine = Engine::new(store.clone());
    TestFamily {
        store,
        engine,
        family_id,
        parent_id,
        child_ids,
        db_path,
        _tempdir: dir,
    }
}

fn draft(reward_kind: RewardKind, amount: i32) -> ChoreDraft {
    ChoreDraft {
        title: "Dishes".into(),
        description: None,
        reward_kind,
        reward_amount: amount,
        requires_photo: false,
        acceptance_timer: 5,
        completion_timer_enabled: false,
        completion_timer_duration: 0,
        completion_timer_penalty: 0,
        reduction_enabled: false,
        reduction_amount: 0,
    }
}

impl TestFamily {
    async fn new_chore(&self, d: ChoreDraft) -> i32 {
        self.store
            .create_chore(self.family_id, self.parent_id, d)
            .await
            .unwrap()
            .id
    }

    fn direct_conn(&self) -> SqliteConnection {
        SqliteConnection::establish(self.db_path.to_str().unwrap()).unwrap()
    }

    /// Moves a running acceptance window into the past so the sweep sees it
    /// as expired.
    fn backdate_assignment_start(&self, chore: i32, minutes: i64) {
        use chorewheel_server::storage::schema::chores::dsl as c;
        let ts = Utc::now().naive_utc() - Duration::minutes(minutes);
        diesel::update(c::chores.filter(c::id.eq(chore)))
            .set(c::assignment_start_time.eq(Some(ts)))
            .execute(&mut self.direct_conn())
            .unwrap();
    }

    fn backdate_completion_start(&self, chore: i32, minutes: i64) {
        use chorewheel_server::storage::schema::chores::dsl as c;
        let ts = Utc::now().naive_utc() - Duration::minutes(minutes);
        diesel::update(c::chores.filter(c::id.eq(chore)))
            .set(c::completion_start_time.eq(Some(ts)))
            .execute(&mut self.direct_conn())
            .unwrap();
    }

    fn pending_assignment_count(&self, chore: i32) -> i64 {
        use chorewheel_server::storage::schema::chore_assignments::dsl as ca;
        ca::chore_assignments
            .filter(ca::chore_id.eq(chore))
            .filter(ca::status.eq(AssignmentStatus::Pending.as_str()))
            .count()
            .get_result(&mut self.direct_conn())
            .unwrap()
    }

    fn assignment_statuses(&self, chore: i32) -> Vec<(i32, String)> {
        use chorewheel_server::storage::schema::chore_assignments::dsl as ca;
        ca::chore_assignments
            .filter(ca::chore_id.eq(chore))
            .order(ca::id.asc())
            .select((ca::user_id, ca::status))
            .load(&mut self.direct_conn())
            .unwrap()
    }
}

#[tokio::test]
async fn round_robin_assigns_each_child_once() {
    let fam = setup(&["ann", "ben", "cleo"]).await;
    let mut assignees = Vec::new();
    for _ in 0..3 {
        let chore_id = fam.new_chore(draft(RewardKind::Money, 100)).await;
        let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
        assert_eq!(chore.status().unwrap(), ChoreStatus::PendingAcceptance);
        assignees.push(chore.current_assignee.unwrap());
    }
    // Fresh family: offers go out in ascending child-id order, one each.
    assert_eq!(assignees, fam.child_ids);
}

#[tokio::test]
async fn round_robin_wraps_past_the_last_child() {
    let fam = setup(&["ann", "ben"]).await;
    let mut assignees = Vec::new();
    for _ in 0..3 {
        let chore_id = fam.new_chore(draft(RewardKind::Money, 100)).await;
        let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
        assignees.push(chore.current_assignee.unwrap());
    }
    assert_eq!(
        assignees,
        vec![fam.child_ids[0], fam.child_ids[1], fam.child_ids[0]]
    );
}

#[tokio::test]
async fn decline_cascade_terminates_in_auto_accept() {
    let fam = setup(&["ann", "ben", "cleo"]).await;
    let mut d = draft(RewardKind::Money, 100);
    d.reduction_enabled = true;
    d.reduction_amount = 30;
    let chore_id = fam.new_chore(d).await;

    let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    let first = chore.current_assignee.unwrap();
    assert_eq!(chore.first_assignee_id, Some(first));

    // First two declines re-offer at full reward; not auto-accepted yet.
    let chore = fam.engine.decline(fam.family_id, chore_id, first).await.unwrap();
    assert_eq!(chore.status().unwrap(), ChoreStatus::PendingAcceptance);
    assert_eq!(chore.current_reward, 100);
    let second = chore.current_assignee.unwrap();
    assert_ne!(second, first);

    let chore = fam
        .engine
        .decline(fam.family_id, chore_id, second)
        .await
        .unwrap();
    assert_eq!(chore.status().unwrap(), ChoreStatus::PendingAcceptance);
    assert_eq!(chore.current_reward, 100);
    let third = chore.current_assignee.unwrap();

    // Third decline exhausts the cycle: back to the first offeree, decayed.
    let chore = fam
        .engine
        .decline(fam.family_id, chore_id, third)
        .await
        .unwrap();
    assert_eq!(chore.status().unwrap(), ChoreStatus::AutoAccepted);
    assert_eq!(chore.current_assignee, Some(first));
    assert_eq!(chore.current_reward, 70);
    assert_eq!(chore.assignment_start_time, None);

    // The fallback assignment is already accepted.
    let rows = fam.assignment_statuses(chore_id);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3], (first, "accepted".to_string()));
    assert_eq!(fam.pending_assignment_count(chore_id), 0);
}

#[tokio::test]
async fn two_child_scenario_decays_to_thirty() {
    // original=50, reduction=20, children A and B
    let fam = setup(&["ann", "ben"]).await;
    let mut d = draft(RewardKind::Money, 50);
    d.reduction_enabled = true;
    d.reduction_amount = 20;
    let chore_id = fam.new_chore(d).await;

    let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    let a = chore.current_assignee.unwrap();
    assert_eq!(a, fam.child_ids[0]);

    let chore = fam.engine.decline(fam.family_id, chore_id, a).await.unwrap();
    let b = chore.current_assignee.unwrap();
    assert_eq!(b, fam.child_ids[1]);
    assert_eq!(chore.current_reward, 50);

    let chore = fam.engine.decline(fam.family_id, chore_id, b).await.unwrap();
    assert_eq!(chore.status().unwrap(), ChoreStatus::AutoAccepted);
    assert_eq!(chore.current_assignee, Some(a));
    assert_eq!(chore.current_reward, 30);
    assert!(chore.current_reward >= reward::minimum_reward(50));
}

#[tokio::test]
async fn every_cascade_step_keeps_one_pending_offer() {
    let fam = setup(&["ann", "ben", "cleo"]).await;
    let chore_id = fam.new_chore(draft(RewardKind::Money, 100)).await;
    fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    assert_eq!(fam.pending_assignment_count(chore_id), 1);

    let mut current = fam
        .store
        .get_chore(fam.family_id, chore_id)
        .await
        .unwrap()
        .unwrap()
        .current_assignee
        .unwrap();
    for _ in 0..2 {
        let chore = fam
            .engine
            .decline(fam.family_id, chore_id, current)
            .await
            .unwrap();
        assert_eq!(fam.pending_assignment_count(chore_id), 1);
        current = chore.current_assignee.unwrap();
    }
}

#[tokio::test]
async fn accept_starts_completion_timer_only_when_enabled() {
    let fam = setup(&["ann", "ben"]).await;

    let chore_id = fam.new_chore(draft(RewardKind::ScreenTime, 45)).await;
    let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    let who = chore.current_assignee.unwrap();
    let chore = fam.engine.accept(fam.family_id, chore_id, who).await.unwrap();
    assert_eq!(chore.status().unwrap(), ChoreStatus::Assigned);
    assert_eq!(chore.assignment_start_time, None);
    assert_eq!(chore.completion_start_time, None);

    let mut d = draft(RewardKind::ScreenTime, 45);
    d.completion_timer_enabled = true;
    d.completion_timer_duration = 30;
    d.completion_timer_penalty = 10;
    let timed_id = fam.new_chore(d).await;
    let chore = fam.engine.assign(fam.family_id, timed_id).await.unwrap();
    let who = chore.current_assignee.unwrap();
    let chore = fam.engine.accept(fam.family_id, timed_id, who).await.unwrap();
    assert!(chore.completion_start_time.is_some());
}

#[tokio::test]
async fn accept_rejects_wrong_actor_and_wrong_state() {
    let fam = setup(&["ann", "ben"]).await;
    let chore_id = fam.new_chore(draft(RewardKind::Money, 10)).await;

    // Not yet assigned: no assignee to match, reads as out-of-scope.
    let err = fam
        .engine
        .accept(fam.family_id, chore_id, fam.child_ids[0])
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(_)));

    let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    let offeree = chore.current_assignee.unwrap();
    let other = *fam.child_ids.iter().find(|id| **id != offeree).unwrap();
    let err = fam
        .engine
        .accept(fam.family_id, chore_id, other)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(_)));

    fam.engine
        .accept(fam.family_id, chore_id, offeree)
        .await
        .unwrap();
    // Accepting twice: the window is gone.
    let err = fam
        .engine
        .accept(fam.family_id, chore_id, offeree)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::PreconditionFailed(_)));
}

#[tokio::test]
async fn assign_requires_available_chore_and_children() {
    let fam = setup(&["ann"]).await;
    let chore_id = fam.new_chore(draft(RewardKind::Money, 10)).await;

    let err = fam.engine.assign(fam.family_id, 9999).await.unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(_)));

    fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    let err = fam.engine.assign(fam.family_id, chore_id).await.unwrap_err();
    assert!(matches!(err, LifecycleError::PreconditionFailed(_)));

    let childless = setup(&[]).await;
    let lonely_chore = childless.new_chore(draft(RewardKind::Money, 10)).await;
    let err = childless
        .engine
        .assign(childless.family_id, lonely_chore)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NoEligibleAssignee));
}

#[tokio::test]
async fn submit_requires_photo_when_configured() {
    let fam = setup(&["ann", "ben"]).await;
    let mut d = draft(RewardKind::Money, 20);
    d.requires_photo = true;
    let chore_id = fam.new_chore(d).await;

    let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    let who = chore.current_assignee.unwrap();
    fam.engine.accept(fam.family_id, chore_id, who).await.unwrap();

    let err = fam
        .engine
        .submit(fam.family_id, chore_id, who, SubmitRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Validation(_)));

    let submission = fam
        .engine
        .submit(
            fam.family_id,
            chore_id,
            who,
            SubmitRequest {
                notes: Some("done!".into()),
                photo_url: Some("/uploads/chore-photos/abc.jpg".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(submission.status().unwrap(), SubmissionStatus::Pending);
    assert_eq!(
        submission.photo_url.as_deref(),
        Some("/uploads/chore-photos/abc.jpg")
    );

    let chore = fam
        .store
        .get_chore(fam.family_id, chore_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chore.status().unwrap(), ChoreStatus::PendingApproval);
}

#[tokio::test]
async fn submit_requires_acceptance_first() {
    let fam = setup(&["ann", "ben"]).await;
    let chore_id = fam.new_chore(draft(RewardKind::Money, 20)).await;
    let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    let who = chore.current_assignee.unwrap();

    let err = fam
        .engine
        .submit(fam.family_id, chore_id, who, SubmitRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::PreconditionFailed(_)));
}

#[tokio::test]
async fn approve_pays_once_and_resets_the_chore() {
    let fam = setup(&["ann", "ben"]).await;
    let chore_id = fam.new_chore(draft(RewardKind::Money, 75)).await;
    let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    let who = chore.current_assignee.unwrap();
    fam.engine.accept(fam.family_id, chore_id, who).await.unwrap();
    let submission = fam
        .engine
        .submit(fam.family_id, chore_id, who, SubmitRequest::default())
        .await
        .unwrap();

    let ledger = fam
        .engine
        .approve(fam.family_id, chore_id, submission.id, fam.parent_id)
        .await
        .unwrap();
    assert_eq!(ledger.reward_earned, 75);
    assert_eq!(ledger.user_id, who);
    assert_eq!(ledger.approved_by, fam.parent_id);

    // Second approval of the same submission is rejected and pays nothing.
    let err = fam
        .engine
        .approve(fam.family_id, chore_id, submission.id, fam.parent_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::PreconditionFailed(_)));

    let completions = fam.store.list_completions_for_chore(chore_id).await.unwrap();
    assert_eq!(completions.len(), 1);

    let child = fam
        .store
        .get_child(fam.family_id, who)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(child.money_balance, 75);
    assert_eq!(child.screen_time_balance, 0);

    let chore = fam
        .store
        .get_chore(fam.family_id, chore_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chore.status().unwrap(), ChoreStatus::Available);
    assert_eq!(chore.current_assignee, None);
    assert_eq!(chore.first_assignee_id, None);
}

#[tokio::test]
async fn approved_screen_time_lands_on_the_other_balance() {
    let fam = setup(&["ann"]).await;
    let chore_id = fam.new_chore(draft(RewardKind::ScreenTime, 30)).await;
    let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    let who = chore.current_assignee.unwrap();
    fam.engine.accept(fam.family_id, chore_id, who).await.unwrap();
    let submission = fam
        .engine
        .submit(fam.family_id, chore_id, who, SubmitRequest::default())
        .await
        .unwrap();
    fam.engine
        .approve(fam.family_id, chore_id, submission.id, fam.parent_id)
        .await
        .unwrap();

    let child = fam
        .store
        .get_child(fam.family_id, who)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(child.screen_time_balance, 30);
    assert_eq!(child.money_balance, 0);
}

#[tokio::test]
async fn reject_keeps_the_assignee_and_allows_resubmission() {
    let fam = setup(&["ann", "ben"]).await;
    let chore_id = fam.new_chore(draft(RewardKind::Money, 40)).await;
    let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    let who = chore.current_assignee.unwrap();
    fam.engine.accept(fam.family_id, chore_id, who).await.unwrap();
    let submission = fam
        .engine
        .submit(fam.family_id, chore_id, who, SubmitRequest::default())
        .await
        .unwrap();

    let err = fam
        .engine
        .reject(
            fam.family_id,
            chore_id,
            submission.id,
            fam.parent_id,
            "  ".into(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Validation(_)));

    let rejected = fam
        .engine
        .reject(
            fam.family_id,
            chore_id,
            submission.id,
            fam.parent_id,
            "still dirty".into(),
        )
        .await
        .unwrap();
    assert_eq!(rejected.status().unwrap(), SubmissionStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("still dirty"));
    assert_eq!(rejected.reviewed_by, Some(fam.parent_id));

    let chore = fam
        .store
        .get_chore(fam.family_id, chore_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chore.status().unwrap(), ChoreStatus::Assigned);
    assert_eq!(chore.current_assignee, Some(who));

    // No payout happened.
    assert!(fam
        .store
        .list_completions_for_chore(chore_id)
        .await
        .unwrap()
        .is_empty());

    let resubmission = fam
        .engine
        .submit(fam.family_id, chore_id, who, SubmitRequest::default())
        .await
        .unwrap();
    let ledger = fam
        .engine
        .approve(fam.family_id, chore_id, resubmission.id, fam.parent_id)
        .await
        .unwrap();
    assert_eq!(ledger.reward_earned, 40);
}

#[tokio::test]
async fn approval_resets_rotation_history_for_the_next_cycle() {
    let fam = setup(&["ann", "ben"]).await;
    let mut d = draft(RewardKind::Money, 50);
    d.reduction_enabled = true;
    d.reduction_amount = 20;
    let chore_id = fam.new_chore(d).await;

    // Cycle one: both decline, auto-accepted back to ann at 30, approved.
    let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    let ann = chore.current_assignee.unwrap();
    let chore = fam.engine.decline(fam.family_id, chore_id, ann).await.unwrap();
    let ben = chore.current_assignee.unwrap();
    fam.engine.decline(fam.family_id, chore_id, ben).await.unwrap();
    let submission = fam
        .engine
        .submit(fam.family_id, chore_id, ann, SubmitRequest::default())
        .await
        .unwrap();
    fam.engine
        .approve(fam.family_id, chore_id, submission.id, fam.parent_id)
        .await
        .unwrap();

    // Cycle two starts fresh: declines from cycle one don't count, so a
    // single decline re-offers instead of exhausting immediately, and the
    // reward is back at the original.
    let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    assert_eq!(chore.current_reward, 50);
    let first = chore.current_assignee.unwrap();
    assert_eq!(chore.first_assignee_id, Some(first));

    let chore = fam
        .engine
        .decline(fam.family_id, chore_id, first)
        .await
        .unwrap();
    assert_eq!(chore.status().unwrap(), ChoreStatus::PendingAcceptance);
    assert_ne!(chore.current_assignee, Some(first));
    assert_eq!(chore.current_reward, 50);
}

#[tokio::test]
async fn sweep_declines_expired_acceptance_on_behalf() {
    let fam = setup(&["ann", "ben"]).await;
    let chore_id = fam.new_chore(draft(RewardKind::Money, 60)).await;
    let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    let first = chore.current_assignee.unwrap();

    // Not yet expired: nothing happens.
    let outcome = fam.engine.sweep_timers().await.unwrap();
    assert_eq!(outcome.acceptances_expired, 0);

    fam.backdate_assignment_start(chore_id, 6);
    let outcome = fam.engine.sweep_timers().await.unwrap();
    assert_eq!(outcome.acceptances_expired, 1);

    let chore = fam
        .store
        .get_chore(fam.family_id, chore_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chore.status().unwrap(), ChoreStatus::PendingAcceptance);
    let second = chore.current_assignee.unwrap();
    assert_ne!(second, first);

    let rows = fam.assignment_statuses(chore_id);
    assert_eq!(rows[0], (first, "declined".to_string()));
    assert_eq!(rows[1], (second, "pending".to_string()));
}

#[tokio::test]
async fn sweep_exhausts_cycle_when_last_offer_expires() {
    let fam = setup(&["ann"]).await;
    let mut d = draft(RewardKind::Money, 50);
    d.reduction_enabled = true;
    d.reduction_amount = 20;
    let chore_id = fam.new_chore(d).await;
    let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    let only = chore.current_assignee.unwrap();

    fam.backdate_assignment_start(chore_id, 10);
    let outcome = fam.engine.sweep_timers().await.unwrap();
    assert_eq!(outcome.acceptances_expired, 1);

    let chore = fam
        .store
        .get_chore(fam.family_id, chore_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chore.status().unwrap(), ChoreStatus::AutoAccepted);
    assert_eq!(chore.current_assignee, Some(only));
    assert_eq!(chore.current_reward, 30);
}

#[tokio::test]
async fn sweep_applies_completion_penalty_once() {
    let fam = setup(&["ann", "ben"]).await;
    let mut d = draft(RewardKind::ScreenTime, 60);
    d.completion_timer_enabled = true;
    d.completion_timer_duration = 30;
    d.completion_timer_penalty = 15;
    let chore_id = fam.new_chore(d).await;
    let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    let who = chore.current_assignee.unwrap();
    fam.engine.accept(fam.family_id, chore_id, who).await.unwrap();

    fam.backdate_completion_start(chore_id, 31);
    let outcome = fam.engine.sweep_timers().await.unwrap();
    assert_eq!(outcome.penalties_applied, 1);

    let chore = fam
        .store
        .get_chore(fam.family_id, chore_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chore.current_reward, 45);
    assert_eq!(chore.completion_start_time, None);
    // Still with the assignee; only the payout shrank.
    assert_eq!(chore.status().unwrap(), ChoreStatus::Assigned);

    // The window is cleared, so the penalty cannot repeat.
    let outcome = fam.engine.sweep_timers().await.unwrap();
    assert_eq!(outcome.penalties_applied, 0);
    let chore = fam
        .store
        .get_chore(fam.family_id, chore_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chore.current_reward, 45);
}

#[tokio::test]
async fn reductions_never_break_the_reward_floor() {
    // Decay at exhaustion and a completion penalty stack within one cycle,
    // but the floor of ceil(original/10) always holds.
    let fam = setup(&["ann"]).await;
    let mut d = draft(RewardKind::Money, 50);
    d.reduction_enabled = true;
    d.reduction_amount = 40;
    d.completion_timer_enabled = true;
    d.completion_timer_duration = 10;
    d.completion_timer_penalty = 40;
    let chore_id = fam.new_chore(d).await;
    let chore = fam.engine.assign(fam.family_id, chore_id).await.unwrap();
    let only = chore.current_assignee.unwrap();

    // Exhaust the cycle: 50 - 40 -> 10, floor is 5.
    let chore = fam
        .engine
        .decline(fam.family_id, chore_id, only)
        .await
        .unwrap();
    assert_eq!(chore.current_reward, 10);

    // Penalty would take it to -30; the floor catches it at 5.
    fam.backdate_completion_start(chore_id, 11);
    fam.engine.sweep_timers().await.unwrap();
    let chore = fam
        .store
        .get_chore(fam.family_id, chore_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chore.current_reward, 5);
    assert_eq!(chore.current_reward, reward::minimum_reward(50));
}
