use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::config::IndeterminatePolicy;
use super::super::source::ProbeResult;

/// What one poll tick observed.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// At least one target met the down threshold.
    Down(Vec<ProbeResult>),
    /// The backend answered and no target is down.
    Clear,
    /// The backend could not be queried; nothing is known about targets.
    Indeterminate,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionTiming {
    pub clear_period: ChronoDuration,
    pub indeterminate: IndeterminatePolicy,
}

/// One continuous outage window. Membership only grows while open.
#[derive(Debug, Clone, PartialEq)]
pub struct OutageSession {
    pub start: DateTime<Utc>,
    pub members: BTreeSet<String>,
    pub alias_by_member: BTreeMap<String, String>,
}

impl OutageSession {
    pub(crate) fn open(start: DateTime<Utc>, downs: &[ProbeResult]) -> Self {
        let mut session = Self {
            start,
            members: BTreeSet::new(),
            alias_by_member: BTreeMap::new(),
        };
        session.absorb(downs);
        session
    }

    pub(crate) fn absorb(&mut self, downs: &[ProbeResult]) {
        for down in downs {
            self.members.insert(down.target.clone());
            self.alias_by_member
                .insert(down.target.clone(), down.alias.clone());
        }
    }

    pub fn alias_of(&self, member: &str) -> &str {
        self.alias_by_member
            .get(member)
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedSession {
    pub session: OutageSession,
    pub end: DateTime<Utc>,
}

impl ClosedSession {
    pub fn duration(&self) -> ChronoDuration {
        self.end.signed_duration_since(self.session.start)
    }
}

/// Tick outcome after the indeterminate policy has been applied.
pub(super) enum Observation<'a> {
    Down(&'a [ProbeResult]),
    Clear,
    Hold,
}

impl<'a> Observation<'a> {
    pub(super) fn resolve(outcome: &'a TickOutcome, policy: IndeterminatePolicy) -> Self {
        match (outcome, policy) {
            (TickOutcome::Down(downs), _) => Self::Down(downs),
            (TickOutcome::Clear, _) => Self::Clear,
            (TickOutcome::Indeterminate, IndeterminatePolicy::TreatAsClear) => Self::Clear,
            (TickOutcome::Indeterminate, IndeterminatePolicy::Hold) => Self::Hold,
        }
    }
}

/// A single global outage session shared by every target.
#[derive(Debug, Default)]
pub struct GlobalSessionTracker {
    session: Option<OutageSession>,
    clear_since: Option<DateTime<Utc>>,
}

impl GlobalSessionTracker {
    pub fn observe(
        &mut self,
        outcome: &TickOutcome,
        now: DateTime<Utc>,
        timing: SessionTiming,
    ) -> Option<ClosedSession> {
        match Observation::resolve(outcome, timing.indeterminate) {
            Observation::Down(downs) => {
                match self.session.as_mut() {
                    Some(session) => session.absorb(downs),
                    None => {
                        let session = OutageSession::open(now, downs);
                        log::info!(
                            "session_opened scope=global start={} members={}",
                            now.to_rfc3339(),
                            join_members(&session.members)
                        );
                        self.session = Some(session);
                    }
                }
                self.clear_since = None;
                None
            }
            Observation::Clear => {
                self.session.as_ref()?;
                let clear_since = *self.clear_since.get_or_insert(now);
                if now.signed_duration_since(clear_since) < timing.clear_period {
                    return None;
                }

                self.clear_since = None;
                let session = self.session.take()?;
                log::info!(
                    "session_closed scope=global start={} end={} members={}",
                    session.start.to_rfc3339(),
                    now.to_rfc3339(),
                    join_members(&session.members)
                );
                Some(ClosedSession { session, end: now })
            }
            Observation::Hold => {
                if self.session.is_some() && self.clear_since.take().is_some() {
                    log::warn!(
                        "session_clear_streak_reset scope=global reason=indeterminate_tick at={}",
                        now.to_rfc3339()
                    );
                }
                None
            }
        }
    }

    pub fn session(&self) -> Option<&OutageSession> {
        self.session.as_ref()
    }

    pub fn clear_since(&self) -> Option<DateTime<Utc>> {
        self.clear_since
    }
}

pub(super) fn join_members(members: &BTreeSet<String>) -> String {
    members.iter().cloned().collect::<Vec<_>>().join(",")
}
