//! The playback session manager.
//!
//! [`PlayerManager`] is the single owner of the mutable session: every
//! mutation funnels through it, and every consumer observes it through
//! snapshots and the event bus. Engine state is re-derived in one place,
//! [`Inner::sync_from_engine`], fed by the engine's notification stream
//! with a periodic poll as backstop for anything the stream misses.
//!
//! Play/pause flips are applied optimistically so the UI reacts before the
//! engine confirms, then re-verified against the engine shortly after. If
//! the engine rejected the command, the verification pass corrects the
//! flags.
//!
//! None of the public operations return errors. Engine and storage
//! failures are logged and the session stays on its last known state; the
//! next notification or poll tick converges it.

use crate::model::{Episode, Podcast};
use crate::persistence;
use crate::session::{clamp_ms, PlayerSnapshot, SessionState, Transport};
use bridge_traits::playback::{EngineNotification, EngineState, RemoteCommand};
use bridge_traits::{AudioEngine, KeyValueStore};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, PlayerEvent, Receiver, RecvError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Playback session manager. Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct PlayerManager {
    inner: Arc<Inner>,
}

struct Inner {
    engine: Arc<dyn AudioEngine>,
    store: Arc<dyn KeyValueStore>,
    config: CoreConfig,
    events: EventBus,
    state: Mutex<SessionState>,
    /// Set on the first user-initiated playback action; restoration will
    /// not overwrite a session the user has already started driving.
    user_interacted: AtomicBool,
    sleep_timer: Mutex<Option<SleepTimer>>,
    /// Monotonic tag for armed timers, so an expiry that raced a re-arm
    /// can tell whether it still owns the slot.
    timer_generation: AtomicU64,
    verify_task: Mutex<Option<JoinHandle<()>>>,
    last_position_save: Mutex<Option<Instant>>,
    shutdown: CancellationToken,
}

struct SleepTimer {
    minutes: u32,
    generation: u64,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// What a reconciliation pass decided, computed under the state lock and
/// acted on after it is released.
struct SyncOutcome {
    position_ms: u64,
    duration_ms: u64,
    position_changed: bool,
    playing: bool,
    just_paused: bool,
}

impl PlayerManager {
    /// Create a manager from a validated configuration. Call
    /// [`start`](Self::start) before using it.
    pub fn new(config: CoreConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine: Arc::clone(&config.engine),
                store: Arc::clone(&config.store),
                events: EventBus::new(config.event_capacity),
                state: Mutex::new(SessionState::new()),
                user_interacted: AtomicBool::new(false),
                sleep_timer: Mutex::new(None),
                timer_generation: AtomicU64::new(0),
                verify_task: Mutex::new(None),
                last_position_save: Mutex::new(None),
                shutdown: CancellationToken::new(),
                config,
            }),
        }
    }

    /// Restore the persisted session and start the background loops.
    ///
    /// Restoration never auto-plays: the restored episode is loaded into
    /// the engine paused, and the restored position is applied once the
    /// engine has finished loading it.
    pub async fn start(&self) {
        self.inner.restore().await;
        self.inner.spawn_loops();
    }

    /// Stop the background loops and any armed timers. Idempotent.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        if let Some(handle) = self.inner.verify_task.lock().take() {
            handle.abort();
        }
        if let Some(timer) = self.inner.sleep_timer.lock().take() {
            timer.token.cancel();
            timer.handle.abort();
        }
        info!("player manager shut down");
    }

    /// Current session state, as one consistent copy.
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.inner.state.lock().snapshot()
    }

    /// Subscribe to player events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.inner.events.subscribe()
    }

    /// Start playing an episode, replacing whatever is loaded.
    pub async fn play_episode(&self, episode: Episode, podcast: Podcast) {
        self.inner.user_interacted.store(true, Ordering::SeqCst);
        self.inner.play_episode(episode, podcast).await;
    }

    /// Flip between playing and paused. No-op when nothing is loaded.
    pub async fn toggle_play_pause(&self) {
        self.inner.user_interacted.store(true, Ordering::SeqCst);
        self.inner.toggle_play_pause().await;
    }

    /// Seek to an absolute position, in milliseconds.
    pub async fn seek_to(&self, position_ms: u64) {
        self.inner.user_interacted.store(true, Ordering::SeqCst);
        self.inner.seek_to_secs(position_ms as f64 / 1000.0).await;
    }

    /// Jump forward by the configured skip step.
    pub async fn skip_forward(&self) {
        self.inner.skip_by(self.inner.config.skip_step_secs).await;
    }

    /// Jump backward by the configured skip step.
    pub async fn skip_backward(&self) {
        self.inner.skip_by(-self.inner.config.skip_step_secs).await;
    }

    /// Set the playback rate. Non-finite or non-positive rates are
    /// rejected and leave the current rate in place.
    pub async fn change_playback_rate(&self, rate: f32) {
        self.inner.change_playback_rate(rate).await;
    }

    /// Cycle the rate through 1.0, 1.5 and 2.0.
    pub async fn toggle_playback_speed(&self) {
        let current = self.inner.state.lock().playback_rate;
        self.inner.change_playback_rate(next_speed(current)).await;
    }

    /// Append an episode to the upcoming queue.
    pub fn add_to_queue(&self, episode: Episode) {
        let len = {
            let mut state = self.inner.state.lock();
            state.queue.push_back(episode);
            state.queue.len()
        };
        self.inner.events.emit(PlayerEvent::QueueUpdated { len }).ok();
    }

    /// Replace the upcoming queue wholesale.
    pub fn set_queue(&self, episodes: Vec<Episode>) {
        let len = episodes.len();
        self.inner.state.lock().queue = episodes.into();
        self.inner.events.emit(PlayerEvent::QueueUpdated { len }).ok();
    }

    /// Play the next queued episode, if any.
    pub async fn play_next(&self) {
        self.inner.user_interacted.store(true, Ordering::SeqCst);
        self.inner.play_next().await;
    }

    /// Restart the current episode when it is meaningfully under way;
    /// otherwise do nothing.
    pub async fn play_previous(&self) {
        self.inner.play_previous().await;
    }

    /// Arm the sleep timer for `minutes`, replacing any armed timer.
    /// Zero minutes disables the timer.
    pub fn start_sleep_timer(&self, minutes: u32) {
        self.inner.start_sleep_timer(minutes);
    }

    /// Disarm the sleep timer, if armed.
    pub fn cancel_sleep_timer(&self) {
        self.inner.cancel_sleep_timer();
    }
}

impl std::fmt::Debug for PlayerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerManager")
            .field("state", &*self.inner.state.lock())
            .finish()
    }
}

impl Inner {
    async fn restore(self: &Arc<Self>) {
        let restored = persistence::load(self.store.as_ref()).await;

        if let Some(rate) = restored.rate {
            self.state.lock().playback_rate = rate;
            if let Err(e) = self.engine.set_rate(rate).await {
                warn!(error = %e, rate, "failed to apply restored playback rate");
            }
        }

        let mut has_episode = false;
        if let (Some(episode), Some(podcast)) = (restored.episode, restored.podcast) {
            // A play request that raced restoration wins.
            if !self.user_interacted.load(Ordering::SeqCst) {
                let track = episode.engine_track(&podcast);
                {
                    let mut state = self.state.lock();
                    state.pending_seek = restored.position_secs.filter(|secs| *secs > 0.0);
                    state.duration_ms = clamp_ms(episode.duration);
                    state.set_current(episode, podcast);
                }

                if let Err(e) = self.load_track(track).await {
                    warn!(error = %e, "failed to load restored episode into engine");
                } else {
                    has_episode = true;
                }
            }
        }

        info!(has_episode, "session restored");
        self.events.emit(PlayerEvent::Restored { has_episode }).ok();
    }

    fn spawn_loops(self: &Arc<Self>) {
        let poll = Arc::clone(self);
        tokio::spawn(async move { poll.reconcile_loop().await });

        let notify = Arc::clone(self);
        tokio::spawn(async move { notify.notification_loop().await });
    }

    async fn reconcile_loop(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so startup state settles.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => self.sync_from_engine().await,
            }
        }
        debug!("reconcile loop stopped");
    }

    async fn notification_loop(self: Arc<Self>) {
        let mut notifications = self.engine.subscribe();
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                received = notifications.recv() => match received {
                    Ok(EngineNotification::StateChanged(state)) => {
                        debug!(?state, "engine state changed");
                        self.sync_from_engine().await;
                    }
                    Ok(EngineNotification::Remote(command)) => {
                        self.handle_remote(command).await;
                    }
                    Err(RecvError::Lagged(missed)) => {
                        // The next poll tick covers whatever was dropped.
                        warn!(missed, "engine notification stream lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        debug!("notification loop stopped");
    }

    async fn handle_remote(self: &Arc<Self>, command: RemoteCommand) {
        debug!(?command, "remote command");
        match command {
            RemoteCommand::Play => {
                if let Err(e) = self.engine.play().await {
                    warn!(error = %e, "remote play failed");
                }
                self.sync_from_engine().await;
            }
            RemoteCommand::Pause => {
                self.pause_and_save().await;
                self.sync_from_engine().await;
            }
            RemoteCommand::Stop => {
                if let Err(e) = self.engine.reset().await {
                    warn!(error = %e, "remote stop failed");
                }
                {
                    let mut state = self.state.lock();
                    state.pending_seek = None;
                    state.is_playing = false;
                    state.is_loading = false;
                }
                self.sync_from_engine().await;
            }
            RemoteCommand::Seek { position } => {
                self.seek_to_secs(position).await;
            }
            RemoteCommand::Next => {
                self.play_next().await;
            }
            RemoteCommand::Previous => {
                self.play_previous().await;
            }
            RemoteCommand::JumpForward { interval } => {
                self.skip_by(interval.unwrap_or(self.config.skip_step_secs))
                    .await;
            }
            RemoteCommand::JumpBackward { interval } => {
                self.skip_by(-interval.unwrap_or(self.config.skip_step_secs))
                    .await;
            }
        }
    }

    async fn play_episode(self: &Arc<Self>, episode: Episode, podcast: Podcast) {
        let switching = {
            let state = self.state.lock();
            state
                .current_episode
                .as_ref()
                .map_or(true, |current| current.id != episode.id)
        };

        let track = episode.engine_track(&podcast);
        let (episode_id, title, rate) = {
            let mut state = self.state.lock();
            if switching {
                state.pending_seek = None;
                state.position_ms = 0;
            }
            state.duration_ms = clamp_ms(episode.duration);
            state.is_playing = true;
            state.is_loading = true;
            state.set_current(episode.clone(), podcast.clone());
            (episode.id.clone(), episode.title.clone(), state.playback_rate)
        };

        info!(%episode_id, switching, "playing episode");
        self.events
            .emit(PlayerEvent::EpisodeChanged {
                episode_id: episode_id.clone(),
                title,
            })
            .ok();

        if switching {
            persistence::reset_position(self.store.as_ref()).await;
        }
        persistence::save_current(self.store.as_ref(), &episode, &podcast).await;

        if let Err(e) = self.load_track(track).await {
            warn!(error = %e, %episode_id, "failed to load episode into engine");
        } else if let Err(e) = self.engine.play().await {
            warn!(error = %e, %episode_id, "engine refused to start playback");
        } else {
            if (rate - 1.0).abs() > f32::EPSILON {
                if let Err(e) = self.engine.set_rate(rate).await {
                    warn!(error = %e, rate, "failed to apply playback rate");
                }
            }
            self.events.emit(PlayerEvent::Started { episode_id }).ok();
        }

        self.schedule_verify();
    }

    /// Reset the single-slot engine and load a track, without playing.
    async fn load_track(
        &self,
        track: bridge_traits::playback::EngineTrack,
    ) -> crate::Result<()> {
        self.engine.reset().await?;
        self.engine.add(track).await?;
        Ok(())
    }

    async fn toggle_play_pause(self: &Arc<Self>) {
        let episode_id = match self.state.lock().current_episode.as_ref() {
            Some(episode) => episode.id.clone(),
            None => {
                debug!("toggle ignored, nothing loaded");
                return;
            }
        };

        let engine_state = match self.engine.playback_state().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "failed to query engine state for toggle");
                return;
            }
        };

        if matches!(engine_state, EngineState::Playing | EngineState::Buffering) {
            let position_ms = {
                let mut state = self.state.lock();
                state.is_playing = false;
                state.is_loading = false;
                state.position_ms
            };
            self.pause_and_save().await;
            self.events.emit(PlayerEvent::Paused { position_ms }).ok();
        } else {
            {
                let mut state = self.state.lock();
                state.is_playing = true;
                state.is_loading = matches!(
                    engine_state,
                    EngineState::None | EngineState::Loading | EngineState::Buffering
                );
            }
            if let Err(e) = self.engine.play().await {
                warn!(error = %e, "engine refused to resume");
            } else {
                self.events.emit(PlayerEvent::Started { episode_id }).ok();
            }
        }

        self.schedule_verify();
    }

    /// Pause the engine and persist the exact stop position.
    async fn pause_and_save(&self) {
        if let Err(e) = self.engine.pause().await {
            warn!(error = %e, "engine refused to pause");
        }
        if let Ok(progress) = self.engine.progress().await {
            persistence::save_position(self.store.as_ref(), progress.position).await;
            *self.last_position_save.lock() = Some(Instant::now());
        }
    }

    async fn seek_to_secs(self: &Arc<Self>, seconds: f64) {
        if !seconds.is_finite() {
            warn!(seconds, "ignoring non-finite seek target");
            return;
        }
        if let Err(e) = self.engine.seek_to(seconds).await {
            warn!(error = %e, seconds, "seek failed");
            return;
        }
        self.refresh_position().await;
    }

    /// Relative jump. The raw target is handed to the engine, which owns
    /// clamping to the stream bounds.
    async fn skip_by(self: &Arc<Self>, delta_secs: f64) {
        let progress = match self.engine.progress().await {
            Ok(progress) => progress,
            Err(e) => {
                warn!(error = %e, "failed to read progress for skip");
                return;
            }
        };

        let target = progress.position + delta_secs;
        if let Err(e) = self.engine.seek_to(target).await {
            warn!(error = %e, target, "skip failed");
            return;
        }
        self.refresh_position().await;
    }

    /// Re-read the engine position after a seek and publish the change.
    async fn refresh_position(&self) {
        let progress = match self.engine.progress().await {
            Ok(progress) => progress,
            Err(e) => {
                warn!(error = %e, "failed to read progress after seek");
                return;
            }
        };

        let (position_ms, duration_ms) = {
            let mut state = self.state.lock();
            state.position_ms = clamp_ms(progress.position);
            if progress.duration > 0.0 {
                state.duration_ms = clamp_ms(progress.duration);
            }
            (state.position_ms, state.duration_ms)
        };
        self.events
            .emit(PlayerEvent::PositionChanged {
                position_ms,
                duration_ms,
            })
            .ok();
    }

    async fn change_playback_rate(&self, rate: f32) {
        if !rate.is_finite() || rate <= 0.0 {
            warn!(rate, "ignoring invalid playback rate");
            return;
        }

        self.state.lock().playback_rate = rate;
        persistence::save_rate(self.store.as_ref(), rate).await;
        if let Err(e) = self.engine.set_rate(rate).await {
            warn!(error = %e, rate, "failed to set engine playback rate");
        }
        self.events.emit(PlayerEvent::RateChanged { rate }).ok();
    }

    async fn play_next(self: &Arc<Self>) {
        let (next, len, current_podcast) = {
            let mut state = self.state.lock();
            let next = state.queue.pop_front();
            (next, state.queue.len(), state.current_podcast.clone())
        };

        let Some(episode) = next else {
            debug!("play_next ignored, queue empty");
            return;
        };

        self.events.emit(PlayerEvent::QueueUpdated { len }).ok();

        let podcast = if episode.has_podcast_fields() {
            Podcast::synthesized(&episode, current_podcast.as_ref())
        } else if let Some(podcast) = current_podcast {
            podcast
        } else {
            warn!(
                episode_id = %episode.id,
                "dropping queued episode with no podcast context"
            );
            return;
        };

        self.play_episode(episode, podcast).await;
    }

    async fn play_previous(self: &Arc<Self>) {
        let progress = match self.engine.progress().await {
            Ok(progress) => progress,
            Err(e) => {
                warn!(error = %e, "failed to read progress for play_previous");
                return;
            }
        };

        if progress.position > self.config.previous_restart_secs {
            self.seek_to_secs(0.0).await;
        } else {
            debug!(
                position = progress.position,
                "play_previous ignored near the start"
            );
        }
    }

    fn start_sleep_timer(self: &Arc<Self>, minutes: u32) {
        let previous = self.sleep_timer.lock().take();
        if let Some(timer) = previous {
            debug!(minutes = timer.minutes, "replacing armed sleep timer");
            timer.token.cancel();
            timer.handle.abort();
        }

        if minutes == 0 {
            let was_armed = self.state.lock().sleep_timer.take().is_some();
            if was_armed {
                self.events.emit(PlayerEvent::SleepTimerCancelled).ok();
            }
            return;
        }

        self.state.lock().sleep_timer = Some(minutes);

        let generation = self.timer_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        let task_token = token.clone();
        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {}
                _ = inner.shutdown.cancelled() => {}
                _ = tokio::time::sleep(Duration::from_secs(u64::from(minutes) * 60)) => {
                    inner.fire_sleep_timer(generation).await;
                }
            }
        });

        *self.sleep_timer.lock() = Some(SleepTimer {
            minutes,
            generation,
            token,
            handle,
        });
        info!(minutes, "sleep timer armed");
        self.events.emit(PlayerEvent::SleepTimerArmed { minutes }).ok();
    }

    fn cancel_sleep_timer(&self) {
        let Some(timer) = self.sleep_timer.lock().take() else {
            return;
        };
        timer.token.cancel();
        timer.handle.abort();
        self.state.lock().sleep_timer = None;
        info!(minutes = timer.minutes, "sleep timer cancelled");
        self.events.emit(PlayerEvent::SleepTimerCancelled).ok();
    }

    async fn fire_sleep_timer(self: &Arc<Self>, generation: u64) {
        // A re-arm that raced this expiry owns the slot now; leave its
        // timer untouched.
        {
            let mut slot = self.sleep_timer.lock();
            match slot.as_ref() {
                Some(timer) if timer.generation == generation => {
                    // Dropping the handle detaches the already-finished task.
                    drop(slot.take());
                }
                _ => {
                    debug!(generation, "stale sleep timer expiry ignored");
                    return;
                }
            }
        }

        info!("sleep timer fired");
        {
            let mut state = self.state.lock();
            state.sleep_timer = None;
            state.is_playing = false;
            state.is_loading = false;
        }

        self.pause_and_save().await;
        self.events.emit(PlayerEvent::SleepTimerFired).ok();
    }

    /// Re-verify an optimistic play/pause flip after a short delay.
    /// Re-arming replaces any verification still in flight.
    fn schedule_verify(self: &Arc<Self>) {
        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = inner.shutdown.cancelled() => {}
                _ = tokio::time::sleep(inner.config.verify_delay) => {
                    inner.sync_from_engine().await;
                }
            }
        });

        if let Some(previous) = self.verify_task.lock().replace(handle) {
            previous.abort();
        }
    }

    /// The single re-derivation routine: everything that observes the
    /// engine funnels through here so session flags can never disagree
    /// with each other about what the engine said.
    async fn sync_from_engine(self: &Arc<Self>) {
        let engine_state = match self.engine.playback_state().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "failed to query engine state");
                return;
            }
        };

        // A restored position waits until the engine has settled on a
        // loaded track, then applies exactly once.
        let settled = !matches!(
            engine_state,
            EngineState::None | EngineState::Loading | EngineState::Buffering
        );
        let pending = if settled {
            self.state.lock().pending_seek.take()
        } else {
            None
        };
        if let Some(target) = pending {
            debug!(target, "applying restored position");
            if let Err(e) = self.engine.seek_to(target).await {
                warn!(error = %e, target, "failed to apply restored position");
            }
        }

        let progress = match self.engine.progress().await {
            Ok(progress) => progress,
            Err(e) => {
                warn!(error = %e, "failed to query engine progress");
                return;
            }
        };

        let outcome = {
            let mut state = self.state.lock();
            let transport = Transport::project(engine_state, state.is_playing);
            let was_playing = state.is_playing;

            let position_ms = clamp_ms(progress.position);
            let duration_ms = if progress.duration > 0.0 {
                clamp_ms(progress.duration)
            } else {
                state
                    .current_episode
                    .as_ref()
                    .map(|episode| clamp_ms(episode.duration))
                    .unwrap_or(0)
            };
            let position_changed =
                position_ms != state.position_ms || duration_ms != state.duration_ms;

            state.position_ms = position_ms;
            state.duration_ms = duration_ms;
            state.apply_transport(transport);

            SyncOutcome {
                position_ms,
                duration_ms,
                position_changed,
                playing: transport == Transport::Playing,
                just_paused: was_playing && transport == Transport::Paused,
            }
        };

        if outcome.position_changed {
            self.events
                .emit(PlayerEvent::PositionChanged {
                    position_ms: outcome.position_ms,
                    duration_ms: outcome.duration_ms,
                })
                .ok();
        }

        if outcome.just_paused {
            // Exact stop position, regardless of the save throttle.
            persistence::save_position(self.store.as_ref(), progress.position).await;
            *self.last_position_save.lock() = Some(Instant::now());
            self.events
                .emit(PlayerEvent::Paused {
                    position_ms: outcome.position_ms,
                })
                .ok();
        } else if outcome.playing && self.position_save_due() {
            persistence::save_position(self.store.as_ref(), progress.position).await;
        }
    }

    fn position_save_due(&self) -> bool {
        let mut last = self.last_position_save.lock();
        match *last {
            Some(at) if at.elapsed() < self.config.position_save_interval => false,
            _ => {
                *last = Some(Instant::now());
                true
            }
        }
    }
}

fn next_speed(rate: f32) -> f32 {
    if (rate - 1.0).abs() < 0.01 {
        1.5
    } else if (rate - 1.5).abs() < 0.01 {
        2.0
    } else {
        1.0
    }
}
