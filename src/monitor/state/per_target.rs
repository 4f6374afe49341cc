use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use super::session::{ClosedSession, Observation, OutageSession, SessionTiming, TickOutcome};

#[derive(Debug, Clone)]
struct TargetSession {
    session: OutageSession,
    clear_since: Option<DateTime<Utc>>,
}

/// One outage session per target, each with its own clear timer.
#[derive(Debug, Default)]
pub struct PerTargetTracker {
    sessions: BTreeMap<String, TargetSession>,
}

impl PerTargetTracker {
    pub fn observe(
        &mut self,
        outcome: &TickOutcome,
        now: DateTime<Utc>,
        timing: SessionTiming,
    ) -> Vec<ClosedSession> {
        let down_now: BTreeSet<&str> = match Observation::resolve(outcome, timing.indeterminate) {
            Observation::Down(downs) => {
                for down in downs {
                    let entry = self
                        .sessions
                        .entry(down.target.clone())
                        .or_insert_with(|| {
                            log::info!(
                                "session_opened scope=target target={} start={}",
                                down.target,
                                now.to_rfc3339()
                            );
                            TargetSession {
                                session: OutageSession::open(now, std::slice::from_ref(down)),
                                clear_since: None,
                            }
                        });
                    entry.session.absorb(std::slice::from_ref(down));
                    entry.clear_since = None;
                }
                downs.iter().map(|down| down.target.as_str()).collect()
            }
            Observation::Clear => BTreeSet::new(),
            Observation::Hold => {
                for state in self.sessions.values_mut() {
                    state.clear_since = None;
                }
                return Vec::new();
            }
        };

        let mut closing = Vec::new();
        for (target, state) in self.sessions.iter_mut() {
            if down_now.contains(target.as_str()) {
                continue;
            }
            let clear_since = *state.clear_since.get_or_insert(now);
            if now.signed_duration_since(clear_since) >= timing.clear_period {
                closing.push(target.clone());
            }
        }

        closing
            .into_iter()
            .filter_map(|target| {
                let state = self.sessions.remove(&target)?;
                log::info!(
                    "session_closed scope=target target={} start={} end={}",
                    target,
                    state.session.start.to_rfc3339(),
                    now.to_rfc3339()
                );
                Some(ClosedSession {
                    session: state.session,
                    end: now,
                })
            })
            .collect()
    }

    pub fn sessions(&self) -> impl Iterator<Item = (&OutageSession, Option<DateTime<Utc>>)> {
        self.sessions
            .values()
            .map(|state| (&state.session, state.clear_since))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::PerTargetTracker;
    use crate::config::IndeterminatePolicy;
    use crate::monitor::ProbeResult;
    use crate::monitor::state::{SessionTiming, TickOutcome};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0)
            .single()
            .expect("valid time")
    }

    fn timing() -> SessionTiming {
        SessionTiming {
            clear_period: Duration::minutes(1),
            indeterminate: IndeterminatePolicy::Hold,
        }
    }

    fn down(targets: &[&str]) -> TickOutcome {
        TickOutcome::Down(
            targets
                .iter()
                .map(|target| ProbeResult {
                    target: target.to_string(),
                    alias: String::new(),
                    failures_per_minute: 9.0,
                })
                .collect(),
        )
    }

    #[test]
    fn targets_recover_independently() {
        let mut tracker = PerTargetTracker::default();

        tracker.observe(&down(&["a", "b"]), t0(), timing());
        // a recovers, b keeps failing
        tracker.observe(&down(&["b"]), t0() + Duration::seconds(10), timing());
        let closed = tracker.observe(&down(&["b"]), t0() + Duration::seconds(70), timing());

        assert_eq!(closed.len(), 1);
        assert!(closed[0].session.members.contains("a"));
        assert_eq!(closed[0].end, t0() + Duration::seconds(70));
        assert_eq!(tracker.sessions().count(), 1);

        tracker.observe(&TickOutcome::Clear, t0() + Duration::seconds(80), timing());
        let closed = tracker.observe(&TickOutcome::Clear, t0() + Duration::seconds(140), timing());
        assert_eq!(closed.len(), 1);
        assert!(closed[0].session.members.contains("b"));
        assert_eq!(tracker.sessions().count(), 0);
    }

    #[test]
    fn indeterminate_resets_every_clear_timer() {
        let mut tracker = PerTargetTracker::default();

        tracker.observe(&down(&["a"]), t0(), timing());
        tracker.observe(&TickOutcome::Clear, t0() + Duration::seconds(5), timing());
        tracker.observe(&TickOutcome::Indeterminate, t0() + Duration::seconds(30), timing());
        let closed = tracker.observe(&TickOutcome::Clear, t0() + Duration::seconds(70), timing());

        assert!(closed.is_empty());
        assert!(tracker.sessions().all(|(_, clear_since)| clear_since.is_some()));
    }
}
