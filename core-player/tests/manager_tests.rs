//! End-to-end manager behavior against scripted bridges.
//!
//! Every test runs with a paused tokio clock, so the reconciliation poll,
//! the optimistic-update verification delay and the sleep timer all fire
//! deterministically when the test advances time.

use bridge_memory::{EngineCommand, MemoryKeyValueStore, ScriptedAudioEngine};
use bridge_traits::playback::RemoteCommand;
use core_player::persistence::keys;
use core_player::{Episode, PlayerManager, Podcast};
use core_runtime::config::CoreConfig;
use core_runtime::events::PlayerEvent;
use std::sync::Arc;
use std::time::Duration;

fn episode(id: &str) -> Episode {
    Episode {
        id: id.to_string(),
        title: format!("Episode {id}"),
        audio_url: format!("https://example.com/{id}.mp3"),
        duration: 1800.0,
        artwork: "https://example.com/art.jpg".to_string(),
        ..Episode::default()
    }
}

fn podcast() -> Podcast {
    Podcast {
        collection_id: 42,
        collection_name: "Test Show".to_string(),
        artist_name: "Tester".to_string(),
        artwork_url_600: "https://example.com/show600.jpg".to_string(),
        ..Podcast::default()
    }
}

fn seed_session(store: &MemoryKeyValueStore, episode: &Episode, position: &str) {
    store.seed(keys::EPISODE, &serde_json::to_string(episode).unwrap());
    store.seed(keys::PODCAST, &serde_json::to_string(&podcast()).unwrap());
    store.seed(keys::POSITION, position);
}

async fn started_manager(
    engine: &Arc<ScriptedAudioEngine>,
    store: &Arc<MemoryKeyValueStore>,
) -> PlayerManager {
    let config = CoreConfig::builder()
        .engine(Arc::clone(engine) as Arc<dyn bridge_traits::AudioEngine>)
        .store(Arc::clone(store) as Arc<dyn bridge_traits::KeyValueStore>)
        .build()
        .unwrap();
    let manager = PlayerManager::new(config);
    manager.start().await;
    manager
}

fn pause_count(engine: &ScriptedAudioEngine) -> usize {
    engine
        .commands()
        .iter()
        .filter(|c| **c == EngineCommand::Pause)
        .count()
}

#[tokio::test(start_paused = true)]
async fn restore_loads_episode_without_autoplay() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    engine.hold_loading(true);
    let store = Arc::new(MemoryKeyValueStore::new());
    seed_session(&store, &episode("ep-1"), "42.5");
    store.seed(keys::RATE, "1.5");

    let manager = started_manager(&engine, &store).await;

    assert_eq!(engine.loaded_track_id().as_deref(), Some("ep-1"));
    assert!(!engine.commands().contains(&EngineCommand::Play));
    assert_eq!(engine.rate(), 1.5);

    let snapshot = manager.snapshot();
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.current_episode.unwrap().id, "ep-1");
    assert_eq!(snapshot.current_podcast.unwrap().collection_name, "Test Show");
    assert_eq!(snapshot.playback_rate, 1.5);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn restored_position_waits_for_loading_then_applies_once() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    engine.hold_loading(true);
    let store = Arc::new(MemoryKeyValueStore::new());
    seed_session(&store, &episode("ep-1"), "42.5");

    let manager = started_manager(&engine, &store).await;

    // Polls while the track is still loading must not seek.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(engine.seeks().is_empty());

    engine.complete_loading();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(engine.seeks(), vec![42.5]);
    assert_eq!(manager.snapshot().position_ms, 42_500);

    // Applied exactly once; later polls leave the play head alone.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(engine.seeks(), vec![42.5]);
    assert!(!manager.snapshot().is_playing);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn restore_emits_event_and_tolerates_empty_storage() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let config = CoreConfig::builder()
        .engine(Arc::clone(&engine) as _)
        .store(Arc::clone(&store) as _)
        .build()
        .unwrap();
    let manager = PlayerManager::new(config);
    let mut events = manager.subscribe();
    manager.start().await;

    assert_eq!(
        events.recv().await.unwrap(),
        PlayerEvent::Restored { has_episode: false }
    );
    let snapshot = manager.snapshot();
    assert!(snapshot.current_episode.is_none());
    assert!(snapshot.current_podcast.is_none());
    assert!(engine.commands().is_empty());

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn malformed_persisted_position_is_ignored() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    engine.hold_loading(true);
    let store = Arc::new(MemoryKeyValueStore::new());
    seed_session(&store, &episode("ep-1"), "NaN");

    let manager = started_manager(&engine, &store).await;
    engine.complete_loading();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(engine.seeks().is_empty());
    assert_eq!(manager.snapshot().position_ms, 0);
    assert_eq!(manager.snapshot().current_episode.unwrap().id, "ep-1");

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn switching_episodes_resets_position_and_discards_restored_seek() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    engine.hold_loading(true);
    let store = Arc::new(MemoryKeyValueStore::new());
    seed_session(&store, &episode("ep-1"), "42.5");

    let manager = started_manager(&engine, &store).await;
    // A different episode starts before the restored one finished loading.
    manager.play_episode(episode("ep-2"), podcast()).await;

    assert_eq!(engine.loaded_track_id().as_deref(), Some("ep-2"));
    assert_eq!(manager.snapshot().position_ms, 0);
    assert_eq!(store.dump().get(keys::POSITION).map(String::as_str), Some("0"));

    engine.complete_loading();
    tokio::time::sleep(Duration::from_secs(2)).await;
    // The stale restored position must never reach the new episode.
    assert!(engine.seeks().is_empty());

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn replaying_the_same_episode_keeps_its_position_record() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;
    store.seed(keys::POSITION, "300");

    manager.play_episode(episode("ep-1"), podcast()).await;
    assert_eq!(
        store.dump().get(keys::POSITION).map(String::as_str),
        Some("300")
    );

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn play_episode_persists_the_pair_and_starts_playback() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;

    let snapshot = manager.snapshot();
    assert!(snapshot.is_playing);
    assert_eq!(snapshot.current_episode.unwrap().id, "ep-1");
    assert_eq!(snapshot.duration_ms, 1_800_000);

    let dump = store.dump();
    assert!(dump.get(keys::EPISODE).unwrap().contains("\"ep-1\""));
    assert!(dump.get(keys::PODCAST).unwrap().contains("\"Test Show\""));

    let commands = engine.commands();
    let play_at = commands.iter().position(|c| *c == EngineCommand::Play);
    let add_at = commands.iter().position(|c| matches!(c, EngineCommand::Add { .. }));
    assert!(add_at.unwrap() < play_at.unwrap());

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn toggle_pauses_and_saves_the_exact_position() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;
    engine.advance(123.0);

    manager.toggle_play_pause().await;
    assert!(!manager.snapshot().is_playing);
    assert_eq!(pause_count(&engine), 1);
    assert_eq!(
        store.dump().get(keys::POSITION).map(String::as_str),
        Some("123")
    );

    manager.toggle_play_pause().await;
    assert!(manager.snapshot().is_playing);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn toggle_without_an_episode_is_a_no_op() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.toggle_play_pause().await;

    assert!(engine.commands().is_empty());
    assert!(!manager.snapshot().is_playing);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn optimistic_play_is_corrected_when_the_engine_refuses() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;
    manager.toggle_play_pause().await;
    assert!(!manager.snapshot().is_playing);

    engine.fail_transport(true);
    manager.toggle_play_pause().await;
    // Optimistic flip is visible immediately.
    assert!(manager.snapshot().is_playing);

    // The delayed verification notices the engine never started.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(!manager.snapshot().is_playing);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn refused_playback_announces_no_start() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    let mut events = manager.subscribe();

    engine.fail_transport(true);
    manager.play_episode(episode("ep-1"), podcast()).await;

    let mut saw_episode_changed = false;
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, PlayerEvent::Started { .. }));
        if matches!(event, PlayerEvent::EpisodeChanged { .. }) {
            saw_episode_changed = true;
        }
    }
    assert!(saw_episode_changed);

    // Resuming against a refusing engine stays silent too.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(!manager.snapshot().is_playing);
    manager.toggle_play_pause().await;
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, PlayerEvent::Started { .. }));
    }

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn skip_hands_the_engine_raw_out_of_range_targets() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;
    engine.advance(3.0);

    manager.skip_backward().await;
    assert_eq!(engine.seeks(), vec![-7.0]);
    // The engine clamped; the session reflects the clamped position.
    assert_eq!(manager.snapshot().position_ms, 0);

    manager.skip_forward().await;
    assert_eq!(engine.seeks(), vec![-7.0, 10.0]);
    assert_eq!(manager.snapshot().position_ms, 10_000);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn seek_to_converts_milliseconds_to_engine_seconds() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;

    manager.seek_to(90_500).await;
    assert_eq!(engine.seeks(), vec![90.5]);
    assert_eq!(manager.snapshot().position_ms, 90_500);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn play_previous_restarts_only_past_the_threshold() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;

    engine.advance(3.0);
    manager.play_previous().await;
    assert!(engine.seeks().is_empty());

    engine.advance(7.0);
    manager.play_previous().await;
    assert_eq!(engine.seeks(), vec![0.0]);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn queue_plays_in_insertion_order() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;
    manager.add_to_queue(episode("ep-2"));
    manager.add_to_queue(episode("ep-3"));
    assert_eq!(manager.snapshot().queue.len(), 2);

    manager.play_next().await;
    assert_eq!(manager.snapshot().current_episode.unwrap().id, "ep-2");
    assert_eq!(manager.snapshot().queue.len(), 1);

    manager.play_next().await;
    assert_eq!(manager.snapshot().current_episode.unwrap().id, "ep-3");

    // Empty queue: the current episode stays put.
    manager.play_next().await;
    assert_eq!(manager.snapshot().current_episode.unwrap().id, "ep-3");

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn queued_episode_with_its_own_metadata_gets_a_synthesized_podcast() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;

    let mut detached = episode("ep-2");
    detached.podcast_title = Some("Detached Show".to_string());
    manager.add_to_queue(detached);
    manager.play_next().await;

    let snapshot = manager.snapshot();
    let current = snapshot.current_podcast.unwrap();
    assert_eq!(current.collection_id, -1);
    assert_eq!(current.collection_name, "Detached Show");
    assert_eq!(current.artist_name, "Unknown Artist");

    // Plain episodes inherit the current podcast instead.
    manager.add_to_queue(episode("ep-3"));
    manager.play_next().await;
    assert_eq!(
        manager.snapshot().current_podcast.unwrap().collection_name,
        "Detached Show"
    );

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn set_queue_replaces_pending_episodes() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;
    manager.add_to_queue(episode("old"));
    manager.set_queue(vec![episode("new-1"), episode("new-2")]);

    manager.play_next().await;
    assert_eq!(manager.snapshot().current_episode.unwrap().id, "new-1");

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn playback_rate_persists_across_restarts() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.change_playback_rate(1.5).await;
    assert_eq!(engine.rate(), 1.5);
    assert_eq!(store.dump().get(keys::RATE).map(String::as_str), Some("1.5"));
    manager.shutdown();

    let engine2 = Arc::new(ScriptedAudioEngine::new());
    let manager2 = started_manager(&engine2, &store).await;
    assert_eq!(manager2.snapshot().playback_rate, 1.5);
    assert_eq!(engine2.rate(), 1.5);

    manager2.shutdown();
}

#[tokio::test(start_paused = true)]
async fn invalid_rates_are_rejected() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.change_playback_rate(1.5).await;

    for bad in [0.0, -2.0, f32::NAN, f32::INFINITY] {
        manager.change_playback_rate(bad).await;
    }
    assert_eq!(manager.snapshot().playback_rate, 1.5);
    assert_eq!(store.dump().get(keys::RATE).map(String::as_str), Some("1.5"));

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn speed_toggle_cycles_through_presets() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    for expected in [1.5, 2.0, 1.0, 1.5] {
        manager.toggle_playback_speed().await;
        assert_eq!(manager.snapshot().playback_rate, expected);
    }
    assert_eq!(engine.rate(), 1.5);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn rearming_the_sleep_timer_replaces_the_previous_one() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;

    manager.start_sleep_timer(5);
    manager.start_sleep_timer(1);
    assert_eq!(manager.snapshot().sleep_timer, Some(1));

    tokio::time::sleep(Duration::from_secs(61)).await;
    let snapshot = manager.snapshot();
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.sleep_timer, None);
    assert_eq!(snapshot.current_episode.unwrap().id, "ep-1");
    assert_eq!(pause_count(&engine), 1);

    // The replaced five-minute timer never fires.
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(pause_count(&engine), 1);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn cancelled_sleep_timer_never_fires() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;

    manager.start_sleep_timer(1);
    manager.cancel_sleep_timer();
    assert_eq!(manager.snapshot().sleep_timer, None);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(manager.snapshot().is_playing);
    assert_eq!(pause_count(&engine), 0);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn sleep_timer_rearmed_after_firing_runs_a_full_cycle() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;

    manager.start_sleep_timer(1);
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert!(!manager.snapshot().is_playing);
    assert_eq!(pause_count(&engine), 1);

    // A fresh timer armed after an expiry must not be disturbed by the
    // spent one.
    manager.toggle_play_pause().await;
    manager.start_sleep_timer(1);
    assert_eq!(manager.snapshot().sleep_timer, Some(1));

    tokio::time::sleep(Duration::from_secs(61)).await;
    let snapshot = manager.snapshot();
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.sleep_timer, None);
    assert_eq!(pause_count(&engine), 2);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn zero_minutes_disables_the_sleep_timer() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;

    manager.start_sleep_timer(2);
    manager.start_sleep_timer(0);
    assert_eq!(manager.snapshot().sleep_timer, None);

    tokio::time::sleep(Duration::from_secs(180)).await;
    assert!(manager.snapshot().is_playing);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn remote_transport_commands_drive_the_session() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;

    engine.remote(RemoteCommand::Pause);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!manager.snapshot().is_playing);
    assert_eq!(pause_count(&engine), 1);

    engine.remote(RemoteCommand::Play);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(manager.snapshot().is_playing);

    engine.remote(RemoteCommand::Seek { position: 90.0 });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(engine.seeks(), vec![90.0]);
    assert_eq!(manager.snapshot().position_ms, 90_000);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn remote_jumps_use_the_platform_interval_when_supplied() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;
    engine.advance(60.0);

    engine.remote(RemoteCommand::JumpForward {
        interval: Some(30.0),
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(engine.seeks(), vec![90.0]);

    engine.remote(RemoteCommand::JumpBackward { interval: None });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(engine.seeks(), vec![90.0, 80.0]);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn remote_next_and_previous_route_to_queue_and_restart() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;
    manager.add_to_queue(episode("ep-2"));

    engine.remote(RemoteCommand::Next);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(manager.snapshot().current_episode.unwrap().id, "ep-2");

    engine.advance(30.0);
    engine.remote(RemoteCommand::Previous);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*engine.seeks().last().unwrap(), 0.0);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn remote_stop_unloads_the_engine_but_keeps_the_episode() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;

    engine.remote(RemoteCommand::Stop);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = manager.snapshot();
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.position_ms, 0);
    assert_eq!(snapshot.current_episode.unwrap().id, "ep-1");
    assert!(engine.loaded_track_id().is_none());

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn storage_failures_never_block_playback() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());
    store.fail_writes(true);

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;
    manager.change_playback_rate(1.5).await;

    let snapshot = manager.snapshot();
    assert!(snapshot.is_playing);
    assert_eq!(snapshot.playback_rate, 1.5);
    assert_eq!(engine.rate(), 1.5);

    manager.shutdown();
}

#[tokio::test(start_paused = true)]
async fn poll_backstop_converges_state_without_notifications() {
    let engine = Arc::new(ScriptedAudioEngine::new());
    let store = Arc::new(MemoryKeyValueStore::new());

    let manager = started_manager(&engine, &store).await;
    manager.play_episode(episode("ep-1"), podcast()).await;

    let mut events = manager.subscribe();
    engine.advance(12.5);
    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(manager.snapshot().position_ms, 12_500);
    let mut saw_position = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, PlayerEvent::PositionChanged { .. }) {
            saw_position = true;
        }
    }
    assert!(saw_position);

    manager.shutdown();
}
