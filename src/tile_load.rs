//! Basemap load completion.
//!
//! A surface is declared ready once, on whichever comes first: the tile streamer reporting
//! zero pending tiles, the short fallback deadline, or the long fallback deadline. The
//! progress signal is not guaranteed to reach zero on flaky networks, so the deadlines are
//! what guarantees the notification.
//!
//! Deadlines run on `Time<Real>`: virtual time is clamped on long frames and stops while
//! paused, and neither may hold the notification back.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::Real;

use crate::events::SurfaceReady;
use crate::events::TileLoadProgress;
use crate::surface::GlobeSurface;

/// Fallback deadlines, measured in wall-clock time from surface open.
#[derive(Resource, Reflect, Debug, Clone)]
#[reflect(Resource)]
pub struct TileLoadConfig {
    pub short_timeout: Duration,
    pub long_timeout:  Duration,
}

impl Default for TileLoadConfig {
    fn default() -> Self {
        Self {
            short_timeout: Duration::from_secs(3),
            long_timeout:  Duration::from_secs(6),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum TileLoadState {
    #[default]
    Pending,
    Ready,
}

/// What declared the surface ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ReadyReason {
    Progress,
    ShortTimeout,
    LongTimeout,
}

/// The single `Pending -> Ready` transition. The caller unregisters `listener` and emits
/// the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyTransition {
    pub reason:   ReadyReason,
    pub listener: Option<Entity>,
}

/// Per-surface load monitor. Lives on the surface entity.
///
/// `fired` is the only thing that decides whether a transition may happen; clearing the
/// deadlines and detaching the listener are cleanup, not the guard.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct TileLoadMonitor {
    state:          TileLoadState,
    fired:          bool,
    reason:         Option<ReadyReason>,
    listener:       Option<Entity>,
    short_deadline: Option<Duration>,
    long_deadline:  Option<Duration>,
    last_pending:   Option<u32>,
}

impl TileLoadMonitor {
    /// Starts a monitor at `now` with both deadlines armed.
    pub fn new(now: Duration, config: &TileLoadConfig) -> Self {
        Self {
            state:          TileLoadState::Pending,
            fired:          false,
            reason:         None,
            listener:       None,
            short_deadline: Some(now + config.short_timeout),
            long_deadline:  Some(now + config.long_timeout),
            last_pending:   None,
        }
    }

    /// Records the entity of the progress listener so it can be unregistered on transition.
    pub const fn attach_listener(&mut self, listener: Entity) { self.listener = Some(listener); }

    pub const fn state(&self) -> TileLoadState { self.state }

    pub const fn is_ready(&self) -> bool { matches!(self.state, TileLoadState::Ready) }

    pub const fn reason(&self) -> Option<ReadyReason> { self.reason }

    pub const fn listener(&self) -> Option<Entity> { self.listener }

    pub const fn last_pending(&self) -> Option<u32> { self.last_pending }

    /// True while either fallback deadline is still armed.
    pub const fn has_pending_deadlines(&self) -> bool {
        self.short_deadline.is_some() || self.long_deadline.is_some()
    }

    /// Feeds a progress report. Zero pending tiles completes the load.
    pub fn on_progress(&mut self, pending: u32) -> Option<ReadyTransition> {
        if self.fired {
            return None;
        }
        self.last_pending = Some(pending);
        if pending == 0 {
            self.mark_ready(ReadyReason::Progress)
        } else {
            None
        }
    }

    /// Fires the earliest elapsed deadline, if any.
    pub fn poll_timers(&mut self, now: Duration) -> Option<ReadyTransition> {
        if self.fired {
            return None;
        }
        let elapsed = |deadline: Option<Duration>| deadline.filter(|d| *d <= now);
        let reason = match (elapsed(self.short_deadline), elapsed(self.long_deadline)) {
            (Some(short), Some(long)) if long < short => ReadyReason::LongTimeout,
            (Some(_), _) => ReadyReason::ShortTimeout,
            (None, Some(_)) => ReadyReason::LongTimeout,
            (None, None) => return None,
        };
        self.mark_ready(reason)
    }

    /// Guarded terminal transition. Returns `None` if the monitor already fired.
    pub fn mark_ready(&mut self, reason: ReadyReason) -> Option<ReadyTransition> {
        if self.fired {
            return None;
        }
        self.fired = true;
        self.state = TileLoadState::Ready;
        self.reason = Some(reason);
        self.short_deadline = None;
        self.long_deadline = None;
        Some(ReadyTransition {
            reason,
            listener: self.listener.take(),
        })
    }

    /// Teardown: consumes the guard without producing a transition. Returns the listener
    /// to unregister.
    pub fn cancel(&mut self) -> Option<Entity> {
        self.fired = true;
        self.short_deadline = None;
        self.long_deadline = None;
        self.listener.take()
    }
}

/// Progress listener. One instance is spawned per surface, watching only that surface.
pub fn on_tile_load_progress(
    progress: On<TileLoadProgress>,
    mut commands: Commands,
    mut surfaces: Query<(&GlobeSurface, &mut TileLoadMonitor)>,
) {
    let surface_entity = progress.surface_entity;
    let Ok((surface, mut monitor)) = surfaces.get_mut(surface_entity) else {
        return;
    };
    if !surface.is_live() {
        return;
    }

    match monitor.on_progress(progress.pending) {
        Some(transition) => complete(&mut commands, surface_entity, transition),
        None => debug!(
            "Surface {surface_entity}: {} tiles pending",
            progress.pending
        ),
    }
}

/// Polls the fallback deadlines of every live surface still loading.
pub fn poll_tile_load_deadlines(
    mut commands: Commands,
    time: Res<Time<Real>>,
    mut surfaces: Query<(Entity, &GlobeSurface, &mut TileLoadMonitor)>,
) {
    let now = time.elapsed();
    for (surface_entity, surface, mut monitor) in &mut surfaces {
        if !surface.is_live() || monitor.is_ready() {
            continue;
        }
        if let Some(transition) = monitor.poll_timers(now) {
            complete(&mut commands, surface_entity, transition);
        }
    }
}

fn complete(commands: &mut Commands, surface_entity: Entity, transition: ReadyTransition) {
    if let Some(listener) = transition.listener {
        commands.entity(listener).try_despawn();
    }
    info!(
        "Surface {surface_entity} ready ({:?})",
        transition.reason
    );
    commands.trigger(SurfaceReady {
        surface_entity,
        reason: transition.reason,
    });
}
