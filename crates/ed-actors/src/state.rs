//! Patient flow states and the bedside nurse's occupied marker.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── PatientState ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatientState {
    #[default]
    WaitingForTriage,
    Triage,
    WaitingForNurse,
    WaitingForFirstAssessment,
    WaitingForTest,
    GoingForTest,
    WaitingForResult,
    WaitingForDoctor,
    WaitingForExit,
    AdmittedBoarding,
    DischargedWaiting,
    Leaving,
}

impl PatientState {
    pub const ALL: [PatientState; 12] = [
        PatientState::WaitingForTriage,
        PatientState::Triage,
        PatientState::WaitingForNurse,
        PatientState::WaitingForFirstAssessment,
        PatientState::WaitingForTest,
        PatientState::GoingForTest,
        PatientState::WaitingForResult,
        PatientState::WaitingForDoctor,
        PatientState::WaitingForExit,
        PatientState::AdmittedBoarding,
        PatientState::DischargedWaiting,
        PatientState::Leaving,
    ];

    pub fn key(self) -> &'static str {
        match self {
            PatientState::WaitingForTriage          => "WAITING_FOR_TRIAGE",
            PatientState::Triage                    => "TRIAGE",
            PatientState::WaitingForNurse           => "WAITING_FOR_NURSE",
            PatientState::WaitingForFirstAssessment => "WAITING_FOR_FIRST_ASSESSMENT",
            PatientState::WaitingForTest            => "WAITING_FOR_TEST",
            PatientState::GoingForTest              => "GOING_FOR_TEST",
            PatientState::WaitingForResult          => "WAITING_FOR_RESULT",
            PatientState::WaitingForDoctor          => "WAITING_FOR_DOCTOR",
            PatientState::WaitingForExit            => "WAITING_FOR_EXIT",
            PatientState::AdmittedBoarding          => "ADMITTED_BOARDING",
            PatientState::DischargedWaiting         => "DISCHARGED_WAITING",
            PatientState::Leaving                   => "LEAVING",
        }
    }

    /// States in which a patient may give up and walk out.
    pub fn walkout_eligible(self) -> bool {
        matches!(
            self,
            PatientState::WaitingForTriage
                | PatientState::Triage
                | PatientState::WaitingForNurse
                | PatientState::WaitingForFirstAssessment
                | PatientState::WaitingForTest
                | PatientState::WaitingForResult
                | PatientState::WaitingForDoctor
                | PatientState::WaitingForExit
        )
    }

    /// Bed-ready states a doctor may claim from the global queue.
    pub fn doctor_ready(self) -> bool {
        matches!(
            self,
            PatientState::WaitingForFirstAssessment
                | PatientState::WaitingForTest
                | PatientState::GoingForTest
                | PatientState::WaitingForResult
                | PatientState::WaitingForDoctor
        )
    }

    /// Disposed (or departing) patients no longer count against a doctor.
    pub fn past_disposition(self) -> bool {
        matches!(
            self,
            PatientState::WaitingForExit
                | PatientState::Leaving
                | PatientState::DischargedWaiting
                | PatientState::AdmittedBoarding
        )
    }

    pub fn indicator(self) -> &'static str {
        match self {
            PatientState::WaitingForTriage
            | PatientState::WaitingForNurse
            | PatientState::WaitingForTest
            | PatientState::WaitingForResult
            | PatientState::WaitingForDoctor
            | PatientState::WaitingForExit => "⌛",
            PatientState::Triage                    => "⚕️",
            PatientState::WaitingForFirstAssessment => "🛌",
            PatientState::GoingForTest              => "🚶‍♂️",
            PatientState::AdmittedBoarding          => "🏥",
            _                                       => "🤢",
        }
    }
}

impl fmt::Display for PatientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ── Occupied ──────────────────────────────────────────────────────────────────

/// What a bedside nurse is tied up with.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "patient", rename_all = "snake_case")]
pub enum Occupied {
    #[default]
    Idle,
    Resting,
    /// Escorting a patient to a zone.
    Transfer(String),
    /// Waiting at the diagnostic room for a patient's test.
    Testing(String),
    /// At a patient's side.
    Attending(String),
}

impl Occupied {
    /// Label used for state-duration accounting.
    pub fn label(&self) -> &'static str {
        match self {
            Occupied::Idle         => "IDLE",
            Occupied::Resting      => "RESTING",
            Occupied::Transfer(_)  => "TRANSFER_WITH_PATIENT",
            Occupied::Testing(_)   => "TESTING_WITH_PATIENT",
            Occupied::Attending(_) => "WITH_PATIENT",
        }
    }

    pub fn patient(&self) -> Option<&str> {
        match self {
            Occupied::Transfer(p) | Occupied::Testing(p) | Occupied::Attending(p) => Some(p),
            Occupied::Idle | Occupied::Resting => None,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Occupied::Idle | Occupied::Resting)
    }
}
