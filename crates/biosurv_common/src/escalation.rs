//! Escalation workflow
//!
//! In-memory, per-session tracking of alerts raised District -> State ->
//! National. Nothing here is persisted: the backend is the source of truth
//! and the board is dropped with the session.
//!
//! ```text
//!            escalate                escalate
//! District ------------> State ----------------> National
//!   status: escalated      acknowledge/monitor -> status: monitoring
//!                          resolve             -> removed
//! ```

use chrono::Utc;
use std::collections::HashMap;
use tracing::info;

use crate::types::{Alert, EscalatedAlert, EscalationStatus, Level};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EscalationError {
    #[error("Alert {0} is already at national level")]
    AlreadyNational(String),

    #[error("Alert {0} is already escalated")]
    AlreadyActive(String),

    #[error("Alert {0} is not escalated")]
    NotFound(String),

    #[error("Alert {0} was already acknowledged by {1}")]
    AlreadyAcknowledged(String, String),
}

/// Operator action on an escalated alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationAction {
    /// Raise one level further
    Escalate,
    /// Receiving level takes ownership
    Acknowledge { by: String },
    /// Keep at the current level under watch
    Monitor { note: Option<String> },
    Resolve,
}

/// Result of applying an action
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Updated(EscalatedAlert),
    Resolved,
}

/// Apply `action` to `current` without touching any board
pub fn apply(current: &EscalatedAlert, action: EscalationAction) -> Result<Transition, EscalationError> {
    let id = &current.alert.id;
    let mut next = current.clone();

    match action {
        EscalationAction::Escalate => {
            let level = current
                .level
                .next()
                .ok_or_else(|| EscalationError::AlreadyNational(id.clone()))?;
            next.level = level;
            next.status = EscalationStatus::Escalated;
            next.acknowledged_by = None;
            next.escalated_at = Utc::now();
        }
        EscalationAction::Acknowledge { by } => {
            if let Some(prev) = &current.acknowledged_by {
                return Err(EscalationError::AlreadyAcknowledged(id.clone(), prev.clone()));
            }
            next.acknowledged_by = Some(by);
            next.status = EscalationStatus::Monitoring;
        }
        EscalationAction::Monitor { note } => {
            next.status = EscalationStatus::Monitoring;
            if let Some(note) = note {
                next.notes.push(note);
            }
        }
        EscalationAction::Resolve => return Ok(Transition::Resolved),
    }

    Ok(Transition::Updated(next))
}

/// Active escalations for one session, keyed by alert id
#[derive(Debug, Default)]
pub struct EscalationBoard {
    active: HashMap<String, EscalatedAlert>,
}

impl EscalationBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Escalate an alert detected at `origin` to the next level
    pub fn raise(&mut self, alert: Alert, origin: Level) -> Result<&EscalatedAlert, EscalationError> {
        let level = origin
            .next()
            .ok_or_else(|| EscalationError::AlreadyNational(alert.id.clone()))?;
        if self.active.contains_key(&alert.id) {
            return Err(EscalationError::AlreadyActive(alert.id));
        }

        info!("Escalating alert {} from {} to {}", alert.id, origin, level);
        let id = alert.id.clone();
        let escalated = EscalatedAlert {
            alert,
            level,
            origin,
            status: EscalationStatus::Escalated,
            escalated_at: Utc::now(),
            acknowledged_by: None,
            notes: Vec::new(),
        };
        Ok(self.active.entry(id).or_insert(escalated))
    }

    /// Track an escalation that already exists elsewhere (e.g. fetched)
    pub fn track(&mut self, escalated: EscalatedAlert) {
        self.active.insert(escalated.alert.id.clone(), escalated);
    }

    pub fn act(&mut self, id: &str, action: EscalationAction) -> Result<Transition, EscalationError> {
        let current = self
            .active
            .get(id)
            .ok_or_else(|| EscalationError::NotFound(id.to_string()))?;
        let transition = apply(current, action)?;

        match &transition {
            Transition::Updated(next) => {
                info!("Alert {} now {} ({:?})", id, next.level, next.status);
                self.active.insert(id.to_string(), next.clone());
            }
            Transition::Resolved => {
                info!("Alert {} resolved", id);
                self.active.remove(id);
            }
        }
        Ok(transition)
    }

    pub fn escalate(&mut self, id: &str) -> Result<Transition, EscalationError> {
        self.act(id, EscalationAction::Escalate)
    }

    pub fn acknowledge(&mut self, id: &str, by: &str) -> Result<Transition, EscalationError> {
        self.act(id, EscalationAction::Acknowledge { by: by.to_string() })
    }

    pub fn monitor(&mut self, id: &str, note: Option<String>) -> Result<Transition, EscalationError> {
        self.act(id, EscalationAction::Monitor { note })
    }

    pub fn resolve(&mut self, id: &str) -> Result<Transition, EscalationError> {
        self.act(id, EscalationAction::Resolve)
    }

    pub fn get(&self, id: &str) -> Option<&EscalatedAlert> {
        self.active.get(id)
    }

    /// Escalations currently owned by `level`, newest first
    pub fn at_level(&self, level: Level) -> Vec<&EscalatedAlert> {
        let mut found: Vec<&EscalatedAlert> =
            self.active.values().filter(|e| e.level == level).collect();
        found.sort_by(|a, b| b.escalated_at.cmp(&a.escalated_at));
        found
    }

    /// Most recent escalation still awaiting acknowledgement
    pub fn pending(&self) -> Option<&EscalatedAlert> {
        self.active
            .values()
            .filter(|e| e.status == EscalationStatus::Escalated)
            .max_by_key(|e| e.escalated_at)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertCategory, AlertSeverity, Country};

    fn alert(id: &str) -> Alert {
        Alert {
            id: id.to_string(),
            title: format!("Alert {}", id),
            description: String::new(),
            severity: AlertSeverity::High,
            category: AlertCategory::Zoonotic,
            country: Country::Us,
            state: Some("Iowa".to_string()),
            district: Some("Story County".to_string()),
            pathogen: Some("H5N1".to_string()),
            cases: None,
            source: None,
            detected_at: Utc::now(),
        }
    }

    #[test]
    fn test_full_path_district_to_national() {
        let mut board = EscalationBoard::new();
        let e = board.raise(alert("a1"), Level::District).unwrap();
        assert_eq!(e.level, Level::State);
        assert_eq!(e.origin, Level::District);
        assert_eq!(e.status, EscalationStatus::Escalated);

        board.acknowledge("a1", "state-officer").unwrap();
        assert_eq!(board.get("a1").unwrap().status, EscalationStatus::Monitoring);

        board.escalate("a1").unwrap();
        let e = board.get("a1").unwrap();
        assert_eq!(e.level, Level::National);
        assert_eq!(e.status, EscalationStatus::Escalated);
        assert!(e.acknowledged_by.is_none());
        assert_eq!(e.origin, Level::District);

        assert_eq!(
            board.escalate("a1"),
            Err(EscalationError::AlreadyNational("a1".to_string()))
        );

        assert_eq!(board.resolve("a1").unwrap(), Transition::Resolved);
        assert!(board.is_empty());
    }

    #[test]
    fn test_cannot_raise_from_national() {
        let mut board = EscalationBoard::new();
        assert!(matches!(
            board.raise(alert("n1"), Level::National),
            Err(EscalationError::AlreadyNational(_))
        ));
    }

    #[test]
    fn test_duplicate_raise_rejected() {
        let mut board = EscalationBoard::new();
        board.raise(alert("a1"), Level::District).unwrap();
        assert!(matches!(
            board.raise(alert("a1"), Level::State),
            Err(EscalationError::AlreadyActive(_))
        ));
    }

    #[test]
    fn test_double_acknowledge() {
        let mut board = EscalationBoard::new();
        board.raise(alert("a1"), Level::State).unwrap();
        board.acknowledge("a1", "noc").unwrap();
        assert_eq!(
            board.acknowledge("a1", "someone-else"),
            Err(EscalationError::AlreadyAcknowledged("a1".to_string(), "noc".to_string()))
        );
    }

    #[test]
    fn test_monitor_keeps_level_and_records_note() {
        let mut board = EscalationBoard::new();
        board.raise(alert("a1"), Level::District).unwrap();
        board.monitor("a1", Some("Cases stable".to_string())).unwrap();
        let e = board.get("a1").unwrap();
        assert_eq!(e.level, Level::State);
        assert_eq!(e.status, EscalationStatus::Monitoring);
        assert_eq!(e.notes, vec!["Cases stable".to_string()]);
        assert!(board.pending().is_none());
    }

    #[test]
    fn test_unknown_id() {
        let mut board = EscalationBoard::new();
        assert_eq!(board.resolve("nope"), Err(EscalationError::NotFound("nope".to_string())));
    }

    #[test]
    fn test_at_level() {
        let mut board = EscalationBoard::new();
        board.raise(alert("a1"), Level::District).unwrap();
        board.raise(alert("a2"), Level::State).unwrap();
        assert_eq!(board.at_level(Level::State).len(), 1);
        assert_eq!(board.at_level(Level::National).len(), 1);
        assert!(board.at_level(Level::District).is_empty());
    }
}
