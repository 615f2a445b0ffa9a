use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use super::common::*;
use crate::workflows::matching::domain::{
    CandidateProfile, InterestArea, Opportunity, Proficiency, SkillRequirement, WorkStyle,
    WORK_STYLE_DIMENSIONS,
};
use crate::workflows::matching::scoring::{
    rank, CategoryThresholds, MatchCategory, MatchScore, ScoreEngine,
};

fn close_to(actual: f32, expected: f32) -> bool {
    (actual - expected).abs() < 0.01
}

#[test]
fn partial_skill_overlap_scores_half() {
    let mut candidate = adult_candidate("cand-react");
    candidate.skills = BTreeMap::from([("React".to_string(), Proficiency::Intermediate)]);

    let score = ScoreEngine::default().compute_match(&candidate, &opportunity("opp-1", 2));

    assert!(close_to(score.skill_match, 50.0), "{score:?}");
    assert!(close_to(score.interest_match, 100.0));
    assert!(close_to(score.style_match, 100.0));
    assert!(close_to(score.overall, 70.0));
}

#[test]
fn lower_proficiency_earns_partial_credit() {
    let mut candidate = adult_candidate("cand-junior");
    candidate.skills = BTreeMap::from([
        ("react".to_string(), Proficiency::Beginner),
        ("css".to_string(), Proficiency::Advanced),
    ]);

    let score = ScoreEngine::default().compute_match(&candidate, &opportunity("opp-1", 2));

    assert!(close_to(score.skill_match, 75.0), "{score:?}");
}

#[test]
fn opportunity_without_requirements_scores_full_skill_match() {
    let mut listing = opportunity("opp-open", 1);
    listing.required_skills.clear();
    let mut candidate = adult_candidate("cand-any");
    candidate.skills.clear();

    let score = ScoreEngine::default().compute_match(&candidate, &listing);

    assert_eq!(score.skill_match, 100.0);
}

#[test]
fn disjoint_interests_lower_the_interest_match() {
    let mut candidate = adult_candidate("cand-arts");
    candidate.interests = BTreeSet::from([InterestArea::Arts, InterestArea::Health]);

    let score = ScoreEngine::default().compute_match(&candidate, &opportunity("opp-1", 2));

    // four of eight areas disagree
    assert!(close_to(score.interest_match, 50.0), "{score:?}");
}

#[test]
fn opposite_work_styles_score_zero() {
    let mut candidate = adult_candidate("cand-style");
    candidate.work_style = WorkStyle([0; WORK_STYLE_DIMENSIONS]);
    let mut listing = opportunity("opp-style", 1);
    listing.work_style = WorkStyle([100; WORK_STYLE_DIMENSIONS]);

    let score = ScoreEngine::default().compute_match(&candidate, &listing);

    assert_eq!(score.style_match, 0.0);
}

#[test]
fn categories_follow_thresholds() {
    let thresholds = CategoryThresholds::default();

    assert_eq!(
        MatchCategory::classify(92.0, 95.0, &thresholds),
        MatchCategory::PerfectMatch
    );
    assert_eq!(
        MatchCategory::classify(85.0, 40.0, &thresholds),
        MatchCategory::PerfectMatch
    );
    assert_eq!(
        MatchCategory::classify(78.0, 80.0, &thresholds),
        MatchCategory::Growth
    );
    assert_eq!(
        MatchCategory::classify(78.0, 50.0, &thresholds),
        MatchCategory::Stretch
    );
    assert_eq!(
        MatchCategory::classify(69.9, 100.0, &thresholds),
        MatchCategory::ComfortZone
    );
}

fn score(candidate: &str, overall: f32, skill_match: f32) -> MatchScore {
    MatchScore {
        candidate_id: candidate_id(candidate),
        opportunity_id: opportunity_id("opp-1"),
        skill_match,
        interest_match: 0.0,
        style_match: 0.0,
        overall,
        category: MatchCategory::ComfortZone,
    }
}

#[test]
fn ranking_breaks_ties_on_skill_then_candidate_id() {
    let ranked = rank(vec![
        score("cand-c", 80.0, 60.0),
        score("cand-b", 80.0, 70.0),
        score("cand-a", 80.0, 60.0),
        score("cand-d", 90.0, 10.0),
    ]);

    let order: Vec<&str> = ranked
        .iter()
        .map(|entry| entry.candidate_id.0.as_str())
        .collect();
    assert_eq!(order, ["cand-d", "cand-b", "cand-a", "cand-c"]);
}

fn proficiency() -> impl Strategy<Value = Proficiency> {
    prop_oneof![
        Just(Proficiency::Beginner),
        Just(Proficiency::Intermediate),
        Just(Proficiency::Advanced),
    ]
}

fn interests() -> impl Strategy<Value = BTreeSet<InterestArea>> {
    prop::collection::btree_set(prop::sample::select(InterestArea::ALL.to_vec()), 0..=8)
}

fn work_style() -> impl Strategy<Value = WorkStyle> {
    prop::array::uniform7(any::<u8>()).prop_map(WorkStyle)
}

const SKILLS: [&str; 5] = ["React", "CSS", "Rust", "SQL", "Figma"];

fn candidate_strategy() -> impl Strategy<Value = CandidateProfile> {
    (
        prop::collection::btree_map(prop::sample::select(SKILLS.to_vec()), proficiency(), 0..5),
        interests(),
        work_style(),
    )
        .prop_map(|(skills, interests, work_style)| CandidateProfile {
            skills: skills
                .into_iter()
                .map(|(name, level)| (name.to_string(), level))
                .collect(),
            interests,
            work_style,
            ..adult_candidate("cand-prop")
        })
}

fn opportunity_strategy() -> impl Strategy<Value = Opportunity> {
    (
        prop::collection::vec(
            (prop::sample::select(SKILLS.to_vec()), proficiency(), 1u32..20),
            0..5,
        ),
        interests(),
        work_style(),
    )
        .prop_map(|(requirements, interests, work_style)| Opportunity {
            required_skills: requirements
                .into_iter()
                .map(|(skill, minimum, weight)| SkillRequirement {
                    skill: skill.to_string(),
                    minimum,
                    weight,
                })
                .collect(),
            interests,
            work_style,
            ..opportunity("opp-prop", 3)
        })
}

proptest! {
    #[test]
    fn scores_stay_in_range_and_are_deterministic(
        candidate in candidate_strategy(),
        listing in opportunity_strategy(),
    ) {
        let engine = ScoreEngine::default();
        let first = engine.compute_match(&candidate, &listing);
        let second = engine.compute_match(&candidate, &listing);

        prop_assert_eq!(&first, &second);
        for component in [first.skill_match, first.interest_match, first.style_match, first.overall] {
            prop_assert!((0.0..=100.0).contains(&component), "{:?}", first);
        }
    }
}
