use super::domain::{CandidateProfile, Opportunity, WorkStyle, MAX_VECTOR_SCORE};

/// Malformed input rejected before any lifecycle work happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
    #[error("{owner} work style axis {axis} is {value}, above 100")]
    WorkStyleOutOfRange {
        owner: String,
        axis: &'static str,
        value: u8,
    },
    #[error("opportunity {opportunity} requires skill '{skill}' with zero weight")]
    ZeroSkillWeight { opportunity: String, skill: String },
    #[error("opportunity {opportunity} lists an unnamed skill requirement")]
    UnnamedSkill { opportunity: String },
    #[error("opportunity {opportunity} must accept at least one applicant")]
    ZeroCapacity { opportunity: String },
    #[error("opportunity {opportunity} has {accepted} accepted applicants above capacity {capacity}")]
    AcceptedAboveCapacity {
        opportunity: String,
        accepted: u32,
        capacity: u32,
    },
}

pub fn require_identifier(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField { field })
    } else {
        Ok(())
    }
}

pub fn validate_candidate(candidate: &CandidateProfile) -> Result<(), ValidationError> {
    require_identifier("candidate_id", &candidate.id.0)?;
    validate_work_style(&candidate.id.0, &candidate.work_style)?;
    if candidate.skills.keys().any(|skill| skill.trim().is_empty()) {
        return Err(ValidationError::EmptyField {
            field: "candidate skill",
        });
    }
    Ok(())
}

pub fn validate_opportunity(opportunity: &Opportunity) -> Result<(), ValidationError> {
    require_identifier("opportunity_id", &opportunity.id.0)?;
    validate_work_style(&opportunity.id.0, &opportunity.work_style)?;

    for requirement in &opportunity.required_skills {
        if requirement.skill.trim().is_empty() {
            return Err(ValidationError::UnnamedSkill {
                opportunity: opportunity.id.0.clone(),
            });
        }
        if requirement.weight == 0 {
            return Err(ValidationError::ZeroSkillWeight {
                opportunity: opportunity.id.0.clone(),
                skill: requirement.skill.clone(),
            });
        }
    }

    if opportunity.capacity == 0 {
        return Err(ValidationError::ZeroCapacity {
            opportunity: opportunity.id.0.clone(),
        });
    }
    if opportunity.current_accepted > opportunity.capacity {
        return Err(ValidationError::AcceptedAboveCapacity {
            opportunity: opportunity.id.0.clone(),
            accepted: opportunity.current_accepted,
            capacity: opportunity.capacity,
        });
    }

    Ok(())
}

fn validate_work_style(owner: &str, style: &WorkStyle) -> Result<(), ValidationError> {
    match style
        .scores()
        .iter()
        .zip(WorkStyle::AXES)
        .find(|(value, _)| **value > MAX_VECTOR_SCORE)
    {
        Some((value, axis)) => Err(ValidationError::WorkStyleOutOfRange {
            owner: owner.to_string(),
            axis,
            value: *value,
        }),
        None => Ok(()),
    }
}
