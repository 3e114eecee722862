//! Integration tests for the duet matchmaking engine
//!
//! These tests validate the engine working end to end:
//! - Connect/stop/next lifecycle scenarios
//! - Compatibility gating and interest preference
//! - Report and block flows
//! - Event emission toward the transport collaborator

mod fixtures;

use duet::config::MatchmakingSettings;
use duet::directory::{InMemoryUserStore, UserStore};
use duet::engine::{ConnectOutcome, Matchmaker, StopOutcome};
use duet::matching::PreferencePolicy;
use duet::types::{ConnectionState, Gender, Preference, UserId};
use std::sync::Arc;

use fixtures::RecordingNotifier;

fn create_test_engine() -> (Matchmaker, Arc<InMemoryUserStore>, Arc<RecordingNotifier>) {
    create_test_engine_with(MatchmakingSettings::default())
}

fn create_test_engine_with(
    settings: MatchmakingSettings,
) -> (Matchmaker, Arc<InMemoryUserStore>, Arc<RecordingNotifier>) {
    let store = Arc::new(InMemoryUserStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = Matchmaker::new(store.clone(), notifier.clone(), settings);
    (engine, store, notifier)
}

fn set_profile(store: &InMemoryUserStore, id: UserId, gender: Gender, pref: Preference) {
    store
        .update(id, &mut |u| {
            u.gender = Some(gender);
            u.preference = Some(pref);
        })
        .unwrap();
}

fn set_interests(store: &InMemoryUserStore, id: UserId, tags: &[&str]) {
    store
        .update(id, &mut |u| {
            u.interests = tags.iter().map(|t| t.to_string()).collect();
        })
        .unwrap();
}

fn connection(store: &InMemoryUserStore, id: UserId) -> ConnectionState {
    store.load(id).unwrap().unwrap().connection
}

#[tokio::test]
async fn test_empty_pool_caller_becomes_waiting() {
    let (engine, store, notifier) = create_test_engine();

    let outcome = engine.connect(1).await.unwrap();
    assert_eq!(outcome, ConnectOutcome::Searching);
    assert_eq!(connection(&store, 1), ConnectionState::Waiting);
    assert_eq!(engine.stats().unwrap().users_waiting, 1);
    assert_eq!(notifier.count_events_of_type("Searching"), 1);
}

#[tokio::test]
async fn test_pairing_is_mutual_and_empties_pool() {
    let (engine, store, notifier) = create_test_engine();

    engine.connect(1).await.unwrap();
    let outcome = engine.connect(2).await.unwrap();
    assert!(matches!(outcome, ConnectOutcome::Paired { partner: 1, .. }));

    // Mutual partner references, both connected, pool empty.
    assert_eq!(
        connection(&store, 1),
        ConnectionState::Connected { partner: 2 }
    );
    assert_eq!(
        connection(&store, 2),
        ConnectionState::Connected { partner: 1 }
    );
    assert_eq!(engine.stats().unwrap().users_waiting, 0);
    assert_eq!(notifier.count_events_of_type("PairConnected"), 1);
}

#[tokio::test]
async fn test_incompatible_pair_never_connects() {
    let (engine, store, _) = create_test_engine();

    // Mutually incompatible by preference: both prefer female, both male.
    set_profile(&store, 1, Gender::Male, Preference::Female);
    set_profile(&store, 2, Gender::Male, Preference::Female);

    engine.connect(1).await.unwrap();
    let outcome = engine.connect(2).await.unwrap();

    assert_eq!(outcome, ConnectOutcome::Searching);
    assert_eq!(connection(&store, 1), ConnectionState::Waiting);
    assert_eq!(connection(&store, 2), ConnectionState::Waiting);
    assert_eq!(engine.stats().unwrap().users_waiting, 2);
}

#[tokio::test]
async fn test_interest_search_skips_and_restores() {
    let (engine, store, _) = create_test_engine();

    // Pool will be [B(no interests), C(music)]; caller A declares music.
    engine.connect(2).await.unwrap();
    set_interests(&store, 3, &["music"]);
    engine.connect(3).await.unwrap();

    set_interests(&store, 10, &["music"]);
    let outcome = engine.connect(10).await.unwrap();

    assert!(matches!(outcome, ConnectOutcome::Paired { partner: 3, .. }));
    // B was skipped-and-restored; final pool = [B].
    assert_eq!(connection(&store, 2), ConnectionState::Waiting);
    assert_eq!(engine.stats().unwrap().users_waiting, 1);
}

#[tokio::test]
async fn test_one_sided_preference_blocks_both_directions() {
    let (engine, store, _) = create_test_engine();

    set_profile(&store, 1, Gender::Female, Preference::Any);
    set_profile(&store, 2, Gender::Male, Preference::Female);
    // 2 accepts 1, but 1 is fine with anyone, so they pair.
    engine.connect(1).await.unwrap();
    assert!(matches!(
        engine.connect(2).await.unwrap(),
        ConnectOutcome::Paired { partner: 1, .. }
    ));

    // Preference is a mutual gate: 3 prefers male, 4 is female.
    set_profile(&store, 3, Gender::Female, Preference::Male);
    set_profile(&store, 4, Gender::Female, Preference::Any);
    engine.connect(3).await.unwrap();
    let outcome = engine.connect(4).await.unwrap();
    assert_eq!(outcome, ConnectOutcome::Searching);
}

#[tokio::test]
async fn test_stop_twice_is_a_noop() {
    let (engine, store, _) = create_test_engine();

    engine.connect(1).await.unwrap();
    engine.connect(2).await.unwrap();

    assert_eq!(
        engine.stop(1).await.unwrap(),
        StopOutcome::Ended { partner: Some(2) }
    );
    assert_eq!(engine.stop(1).await.unwrap(), StopOutcome::NotInSession);
    assert_eq!(engine.stop(1).await.unwrap(), StopOutcome::NotInSession);

    assert_eq!(connection(&store, 1), ConnectionState::Idle);
    assert_eq!(connection(&store, 2), ConnectionState::Idle);
}

#[tokio::test]
async fn test_report_flow() {
    let (engine, store, notifier) = create_test_engine();

    engine.connect(1).await.unwrap();
    engine.connect(2).await.unwrap();

    engine.report(1).await.unwrap();

    let reported = store.load(2).unwrap().unwrap();
    assert_eq!(reported.report_count, 1);
    assert_eq!(reported.connection, ConnectionState::Idle);
    assert_eq!(connection(&store, 1), ConnectionState::Idle);

    // The reported partner is told the chat ended.
    assert_eq!(notifier.chat_ended_for(2).len(), 1);
}

#[tokio::test]
async fn test_report_warning_threshold() {
    let (engine, store, notifier) = create_test_engine();

    // Partner 1 carries three reports; the next match warns the other side.
    store
        .update(1, &mut |u| {
            u.report_count = 3;
        })
        .unwrap();

    engine.connect(1).await.unwrap();
    engine.connect(2).await.unwrap();

    assert_eq!(notifier.count_events_of_type("ReportWarning"), 1);
    // Warning is advisory: the pairing still committed.
    assert_eq!(
        connection(&store, 1),
        ConnectionState::Connected { partner: 2 }
    );
}

#[tokio::test]
async fn test_block_is_permanent_for_future_matches() {
    let (engine, store, _) = create_test_engine();

    engine.connect(1).await.unwrap();
    engine.connect(2).await.unwrap();
    engine.block(2).await.unwrap();

    // Both return to the pool; the block keeps them apart...
    engine.connect(1).await.unwrap();
    assert_eq!(engine.connect(2).await.unwrap(), ConnectOutcome::Searching);

    // ...but a third user pairs with the head of the queue normally.
    let outcome = engine.connect(3).await.unwrap();
    assert!(matches!(outcome, ConnectOutcome::Paired { partner: 1, .. }));
    assert_eq!(connection(&store, 2), ConnectionState::Waiting);
}

#[tokio::test]
async fn test_next_finds_replacement_partner() {
    let (engine, store, notifier) = create_test_engine();

    engine.connect(1).await.unwrap();
    engine.connect(2).await.unwrap();
    engine.connect(3).await.unwrap(); // 3 waits

    let outcome = engine.next(1).await.unwrap();
    assert!(matches!(outcome, ConnectOutcome::Paired { partner: 3, .. }));

    assert_eq!(connection(&store, 2), ConnectionState::Idle);
    assert_eq!(
        connection(&store, 1),
        ConnectionState::Connected { partner: 3 }
    );
    assert_eq!(notifier.chat_ended_for(2).len(), 1);
}

#[tokio::test]
async fn test_strict_policy_requires_profiles() {
    let settings = MatchmakingSettings {
        preference_policy: PreferencePolicy::StrictPreferenceRequired,
        ..MatchmakingSettings::default()
    };
    let (engine, store, _) = create_test_engine_with(settings);

    engine.connect(1).await.unwrap();
    assert_eq!(engine.connect(2).await.unwrap(), ConnectOutcome::Searching);

    set_profile(&store, 1, Gender::Male, Preference::Any);
    set_profile(&store, 2, Gender::Female, Preference::Any);

    // Both still waiting; a fresh connect now succeeds.
    let outcome = engine.next(2).await.unwrap();
    assert!(matches!(outcome, ConnectOutcome::Paired { partner: 1, .. }));
}

#[tokio::test]
async fn test_waiting_user_can_leave_and_rejoin() {
    let (engine, store, _) = create_test_engine();

    engine.connect(1).await.unwrap();
    assert_eq!(engine.stop(1).await.unwrap(), StopOutcome::LeftQueue);
    assert_eq!(connection(&store, 1), ConnectionState::Idle);
    assert_eq!(engine.stats().unwrap().users_waiting, 0);

    assert_eq!(engine.connect(1).await.unwrap(), ConnectOutcome::Searching);
    assert_eq!(engine.stats().unwrap().users_waiting, 1);
}

/// Sequences of engine operations always leave the partner relation a
/// perfect matching: every connected user's partner points back, and nobody
/// is both waiting and partnered.
#[test]
fn prop_partner_relation_is_perfect_matching() {
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Connect(UserId),
        Stop(UserId),
        Next(UserId),
        Report(UserId),
    }

    fn op_strategy(population: UserId) -> impl Strategy<Value = Op> {
        (0..4u8, 1..=population).prop_map(|(kind, id)| match kind {
            0 => Op::Connect(id),
            1 => Op::Stop(id),
            2 => Op::Next(id),
            _ => Op::Report(id),
        })
    }

    proptest!(|(ops in proptest::collection::vec(op_strategy(8), 1..60))| {
        tokio_test::block_on(async {
            let (engine, store, _) = create_test_engine();

            for op in &ops {
                match *op {
                    Op::Connect(id) => { let _ = engine.connect(id).await; }
                    Op::Stop(id) => { let _ = engine.stop(id).await; }
                    Op::Next(id) => { let _ = engine.next(id).await; }
                    Op::Report(id) => { let _ = engine.report(id).await; }
                }
            }

            for id in 1..=8 {
                let Some(user) = store.load(id).unwrap() else { continue };
                if let Some(partner_id) = user.partner_id() {
                    let partner = store.load(partner_id).unwrap().unwrap();
                    prop_assert_eq!(partner.partner_id(), Some(id));
                    prop_assert!(user.is_connected() && partner.is_connected());
                }
            }
            Ok(())
        }).unwrap();
    });
}
