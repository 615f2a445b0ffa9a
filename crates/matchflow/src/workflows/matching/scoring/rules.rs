use super::super::domain::{
    CandidateProfile, InterestArea, Opportunity, WorkStyle, MAX_VECTOR_SCORE,
};

const FULL_CREDIT: f32 = 1.0;
const PARTIAL_CREDIT: f32 = 0.5;

/// Weighted share of required skills the candidate covers, 0-100.
///
/// An opportunity without requirements scores 100.
pub(crate) fn skill_match(candidate: &CandidateProfile, opportunity: &Opportunity) -> f32 {
    let total_weight: u64 = opportunity
        .required_skills
        .iter()
        .map(|requirement| u64::from(requirement.weight))
        .sum();
    if total_weight == 0 {
        return 100.0;
    }

    let earned: f32 = opportunity
        .required_skills
        .iter()
        .map(|requirement| {
            let overlap = match candidate.proficiency(&requirement.skill) {
                Some(level) if level >= requirement.minimum => FULL_CREDIT,
                Some(_) => PARTIAL_CREDIT,
                None => 0.0,
            };
            requirement.weight as f32 * overlap
        })
        .sum();

    earned / total_weight as f32 * 100.0
}

/// Similarity of the interest-area indicator vectors, 0-100.
pub(crate) fn interest_match(candidate: &CandidateProfile, opportunity: &Opportunity) -> f32 {
    let indicator = |present: bool| if present { MAX_VECTOR_SCORE } else { 0 };
    let candidate_vector =
        InterestArea::ALL.map(|area| indicator(candidate.interests.contains(&area)));
    let opportunity_vector =
        InterestArea::ALL.map(|area| indicator(opportunity.interests.contains(&area)));
    vector_similarity(&candidate_vector, &opportunity_vector)
}

/// Similarity of the candidate's and the opportunity owner's work styles, 0-100.
pub(crate) fn style_match(candidate: &WorkStyle, owner: &WorkStyle) -> f32 {
    vector_similarity(candidate.scores(), owner.scores())
}

/// `100 - mean(|a_i - b_i|)`, clamped so malformed inputs cannot escape the range.
pub(crate) fn vector_similarity(left: &[u8], right: &[u8]) -> f32 {
    let dimensions = left.len().min(right.len());
    if dimensions == 0 {
        return 100.0;
    }

    let total_difference: u32 = left
        .iter()
        .zip(right)
        .map(|(&a, &b)| {
            let a = a.min(MAX_VECTOR_SCORE);
            let b = b.min(MAX_VECTOR_SCORE);
            u32::from(a.abs_diff(b))
        })
        .sum();
    let average = total_difference as f32 / dimensions as f32;
    (100.0 - average).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_are_fully_similar() {
        assert_eq!(vector_similarity(&[10, 90, 50], &[10, 90, 50]), 100.0);
    }

    #[test]
    fn opposite_vectors_are_dissimilar() {
        assert_eq!(vector_similarity(&[0, 100], &[100, 0]), 0.0);
    }

    #[test]
    fn out_of_range_components_are_capped() {
        assert_eq!(vector_similarity(&[255], &[100]), 100.0);
    }
}
