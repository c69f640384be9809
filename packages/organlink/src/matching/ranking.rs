use super::EnhancedMatches;
use crate::feedback::Feedback;
use crate::model::{EntityId, MatchCandidate, Patient};

/// Number of candidates shown for a search
pub const TOP_MATCHES: usize = 5;

///
/// Candidates ordered by `match_score`, highest first.
///
/// Scores are computed by the server, the client only orders them.
/// The sort is stable so equal scores keep the server's order.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RankedMatches {
    candidates: Vec<MatchCandidate>,
}

impl RankedMatches {
    pub fn new(mut candidates: Vec<MatchCandidate>) -> Self {
        candidates.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        RankedMatches { candidates }
    }

    pub fn total(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn all(&self) -> &[MatchCandidate] {
        &self.candidates
    }

    pub fn visible(&self) -> &[MatchCandidate] {
        let end = self.candidates.len().min(TOP_MATCHES);
        &self.candidates[..end]
    }

    pub fn is_truncated(&self) -> bool {
        self.candidates.len() > TOP_MATCHES
    }

    pub fn caption(&self) -> Option<String> {
        self.is_truncated()
            .then(|| format!("Showing top {TOP_MATCHES} of {} matches", self.total()))
    }

    pub fn find(&self, donor_id: &EntityId) -> Option<&MatchCandidate> {
        self.candidates.iter().find(|c| &c.donor_id == donor_id)
    }
}

///
/// Result of the latest search, replaced wholesale by the next one
///
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResults {
    pub patient: Patient,
    pub matches: RankedMatches,
    pub policy_applied: bool,
    pub policy_title: Option<String>,
}

impl SearchResults {
    pub fn new(patient: Patient, response: EnhancedMatches) -> Self {
        SearchResults {
            patient,
            matches: RankedMatches::new(response.matches),
            policy_applied: response.policy_applied,
            policy_title: response.policy_title,
        }
    }

    pub fn feedback(&self) -> Feedback {
        let count = self.matches.total();

        if count == 0 {
            return Feedback::warning(format!(
                "No compatible donors found for {}",
                self.patient.full_name
            ));
        }

        let noun = if count == 1 { "donor" } else { "donors" };
        let mut message = format!("Found {count} compatible {noun}");

        if self.policy_applied {
            match &self.policy_title {
                Some(title) if !title.trim().is_empty() => {
                    message.push_str(&format!(" (allocation policy applied: {title})"))
                }
                _ => message.push_str(" (allocation policy applied)"),
            }
        }

        Feedback::success(message)
    }
}
