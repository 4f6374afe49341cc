use chrono::{DateTime, Utc};

use crate::config::SessionMode;

mod per_target;
mod session;
mod throttle;

pub use per_target::PerTargetTracker;
pub use session::{
    ClosedSession, GlobalSessionTracker, OutageSession, SessionTiming, TickOutcome,
};
pub use throttle::{GLOBAL_THROTTLE_KEY, NotificationThrottle};

/// Session strategy selected at startup.
#[derive(Debug)]
pub enum OutageTracker {
    Global(GlobalSessionTracker),
    PerTarget(PerTargetTracker),
}

impl OutageTracker {
    pub fn new(mode: SessionMode) -> Self {
        match mode {
            SessionMode::Global => Self::Global(GlobalSessionTracker::default()),
            SessionMode::PerTarget => Self::PerTarget(PerTargetTracker::default()),
        }
    }

    pub fn mode(&self) -> SessionMode {
        match self {
            Self::Global(_) => SessionMode::Global,
            Self::PerTarget(_) => SessionMode::PerTarget,
        }
    }

    pub fn observe(
        &mut self,
        outcome: &TickOutcome,
        now: DateTime<Utc>,
        timing: SessionTiming,
    ) -> Vec<ClosedSession> {
        match self {
            Self::Global(tracker) => tracker.observe(outcome, now, timing).into_iter().collect(),
            Self::PerTarget(tracker) => tracker.observe(outcome, now, timing),
        }
    }

    pub fn open_sessions(&self) -> Vec<SessionSnapshot> {
        match self {
            Self::Global(tracker) => tracker
                .session()
                .map(|session| SessionSnapshot::of(session, tracker.clear_since()))
                .into_iter()
                .collect(),
            Self::PerTarget(tracker) => tracker
                .sessions()
                .map(|(session, clear_since)| SessionSnapshot::of(session, clear_since))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    Down,
    Clear,
    Indeterminate,
}

impl TickKind {
    pub fn of(outcome: &TickOutcome) -> Self {
        match outcome {
            TickOutcome::Down(_) => Self::Down,
            TickOutcome::Clear => Self::Clear,
            TickOutcome::Indeterminate => Self::Indeterminate,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::Clear => "clear",
            Self::Indeterminate => "indeterminate",
        }
    }
}

#[derive(Debug)]
pub struct MonitorState {
    pub(crate) tracker: OutageTracker,
    pub(crate) throttle: NotificationThrottle,
    pub(crate) last_tick: Option<(DateTime<Utc>, TickKind)>,
    pub(crate) alerts_sent: u64,
    pub(crate) sessions_closed: u64,
}

impl MonitorState {
    pub fn new(mode: SessionMode, cooldown_secs: u64) -> Self {
        Self {
            tracker: OutageTracker::new(mode),
            throttle: NotificationThrottle::new(cooldown_secs),
            last_tick: None,
            alerts_sent: 0,
            sessions_closed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub start: DateTime<Utc>,
    pub members: Vec<(String, String)>,
    pub clear_since: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    fn of(session: &OutageSession, clear_since: Option<DateTime<Utc>>) -> Self {
        Self {
            start: session.start,
            members: session
                .members
                .iter()
                .map(|member| (member.clone(), session.alias_of(member).to_string()))
                .collect(),
            clear_since,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitorSnapshot {
    pub mode: SessionMode,
    pub open_sessions: Vec<SessionSnapshot>,
    pub last_tick: Option<(DateTime<Utc>, TickKind)>,
    pub last_global_alert_at: Option<DateTime<Utc>>,
    pub alerts_sent: u64,
    pub sessions_closed: u64,
}
