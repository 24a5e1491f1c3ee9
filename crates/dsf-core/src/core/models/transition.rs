use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Shape classification derived from the number of surviving transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    NoTransition,
    Monophasic,
    Multiphasic,
}

impl TransitionType {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => TransitionType::NoTransition,
            1 => TransitionType::Monophasic,
            _ => TransitionType::Multiphasic,
        }
    }
}

/// One unfolding event located on the derivative curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub onset_temp: f64,
    /// The melting temperature (Tm) of this transition.
    pub peak_temp: f64,
    pub offset_temp: f64,
    /// Signed derivative value at the peak.
    pub peak_slope: f64,
    pub confidence: f64,
    /// Derivative magnitude at the peak.
    pub height: f64,
    /// `false` when the onset crossing lies before the first sampled temperature.
    pub onset_resolved: bool,
    /// `false` when the offset crossing lies beyond the last sampled temperature.
    pub offset_resolved: bool,
    #[serde(skip)]
    pub(crate) onset_index: usize,
    #[serde(skip)]
    pub(crate) peak_index: usize,
    #[serde(skip)]
    pub(crate) offset_index: usize,
}

impl Transition {
    pub fn width(&self) -> f64 {
        self.offset_temp - self.onset_temp
    }

    pub fn is_truncated(&self) -> bool {
        !self.onset_resolved || !self.offset_resolved
    }

    pub fn contains_temperature(&self, temperature: f64) -> bool {
        temperature >= self.onset_temp && temperature <= self.offset_temp
    }

    /// Sample indices `(onset, peak, offset)` on the curve this transition was found on.
    pub fn indices(&self) -> (usize, usize, usize) {
        (self.onset_index, self.peak_index, self.offset_index)
    }

    /// Ranking used to pick the reported Tm: higher confidence first, then larger
    /// height, then the lower peak temperature. `Ordering::Less` means `self` ranks
    /// ahead of `other`.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .confidence
            .total_cmp(&self.confidence)
            .then_with(|| other.height.total_cmp(&self.height))
            .then_with(|| self.peak_temp.total_cmp(&other.peak_temp))
    }
}

/// The transitions found on one curve, ordered by ascending peak temperature.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionSet {
    transitions: Vec<Transition>,
}

impl TransitionSet {
    pub fn new(mut transitions: Vec<Transition>) -> Self {
        transitions.sort_by(|a, b| a.peak_temp.total_cmp(&b.peak_temp));
        Self { transitions }
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transition> {
        self.transitions.iter()
    }

    pub fn as_slice(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn transition_type(&self) -> TransitionType {
        TransitionType::from_count(self.transitions.len())
    }

    /// The transition that defines "the" Tm, if any survived thresholding.
    pub fn dominant(&self) -> Option<&Transition> {
        self.transitions.iter().min_by(|a, b| a.rank_cmp(b))
    }
}

impl<'a> IntoIterator for &'a TransitionSet {
    type Item = &'a Transition;
    type IntoIter = std::slice::Iter<'a, Transition>;

    fn into_iter(self) -> Self::IntoIter {
        self.transitions.iter()
    }
}
