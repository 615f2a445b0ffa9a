use crate::infra::{
    seeded_stores, SeededStores, CANDIDATE_TOKEN, GUARDIAN_TOKEN, OWNER_TOKEN, SAMPLE_ADULT,
    SAMPLE_MINOR, SAMPLE_OPPORTUNITY,
};
use clap::Args;
use matchflow::error::AppError;
use matchflow::workflows::matching::{
    AccessToken, ApplicationEvent, ApplicationRecord, ApplicationState, CandidateId, Decision,
    MatchScore, MatchingService, MatchingSettings, OpportunityId,
};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Age of the seeded student; anything under 18 routes through guardian consent.
    #[arg(long, default_value_t = 16)]
    pub(crate) candidate_age: u8,
    /// Stop after scoring and submission instead of walking the full lifecycle.
    #[arg(long)]
    pub(crate) skip_lifecycle: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        candidate_age,
        skip_lifecycle,
    } = args;

    let stores = seeded_stores(candidate_age);
    let service = MatchingService::new(stores.ports(), MatchingSettings::default());
    let opportunity = OpportunityId(SAMPLE_OPPORTUNITY.to_string());
    let student = CandidateId(SAMPLE_MINOR.to_string());
    let peer = CandidateId(SAMPLE_ADULT.to_string());

    println!("Matchflow demo");
    println!("Opportunity: {opportunity}");
    for candidate in [&student, &peer] {
        let score = service.get_match_score(candidate, &opportunity)?;
        render_score(&score);
    }

    let outcome = service.apply(&student, &opportunity)?;
    println!(
        "\nSubmitted {} for {student} -> {}",
        outcome.application_id, outcome.state
    );
    let peer_outcome = service.apply(&peer, &opportunity)?;
    println!(
        "Submitted {} for {peer} -> {}",
        peer_outcome.application_id, peer_outcome.state
    );

    println!("\nRanking");
    for (position, score) in service.rank_applicants(&opportunity)?.iter().enumerate() {
        println!(
            "  {}. {} overall {:.1} ({})",
            position + 1,
            score.candidate_id,
            score.overall,
            score.category.label()
        );
    }

    if skip_lifecycle {
        render_sinks(&stores);
        return Ok(());
    }

    let application = outcome.application_id;
    if outcome.state == ApplicationState::PendingGuardianConsent {
        let guardian = AccessToken(GUARDIAN_TOKEN.to_string());
        let record = service.guardian_decision(&application, &guardian, Decision::Approve)?;
        render_step("guardian approved", &record);
    }

    let owner = service.resolve_actor(&AccessToken(OWNER_TOKEN.to_string()))?;
    let record = service.owner_decision(&application, &owner, Decision::Approve)?;
    render_step("owner approved", &record);
    let record = service.transition(&application, &owner, ApplicationEvent::Start)?;
    render_step("work started", &record);
    let record = service.transition(&application, &owner, ApplicationEvent::Complete)?;
    render_step("work completed", &record);

    let candidate = service.resolve_actor(&AccessToken(CANDIDATE_TOKEN.to_string()))?;
    if let Err(err) = service.withdraw(&application, &candidate) {
        println!("Withdrawing a completed application is refused: {err}");
    }

    let summary = service.close_opportunity(&opportunity, &owner)?;
    println!(
        "\nClosed {opportunity}: {} application(s) closed, {} deferred",
        summary.closed.len(),
        summary.deferred.len()
    );

    println!("\nHistory for {application}");
    for entry in service.get(&application)?.history {
        let reason = entry.reason.map(|reason| reason.label()).unwrap_or("-");
        println!(
            "  {} {:<24} by {:<28} {}",
            entry.at.format("%H:%M:%S"),
            entry.state.label(),
            entry.actor,
            reason
        );
    }

    render_sinks(&stores);
    Ok(())
}

fn render_score(score: &MatchScore) {
    println!(
        "  {}: skill {:.1}, interest {:.1}, style {:.1} => overall {:.1} ({})",
        score.candidate_id,
        score.skill_match,
        score.interest_match,
        score.style_match,
        score.overall,
        score.category.label()
    );
}

fn render_step(label: &str, record: &ApplicationRecord) {
    println!("  {label}: {} is {}", record.id, record.state);
}

fn render_sinks(stores: &SeededStores) {
    let notifications = stores.notifications.events();
    println!("\nNotifications ({})", notifications.len());
    for notification in notifications {
        println!(
            "  {} -> {} [{}]",
            notification.template, notification.recipient, notification.application_id
        );
    }

    let awards = stores.credentials.awards();
    println!("Credentials ({})", awards.len());
    for award in awards {
        println!(
            "  {} earned {} XP for {}",
            award.candidate_id, award.xp, award.opportunity_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_walkthrough_completes() {
        run_demo(DemoArgs {
            candidate_age: 16,
            skip_lifecycle: false,
        })
        .expect("demo completes");
    }

    #[test]
    fn underage_candidates_stop_the_demo() {
        let err = run_demo(DemoArgs {
            candidate_age: 11,
            skip_lifecycle: true,
        })
        .expect_err("below the seeded minimum age");
        assert!(err.to_string().contains("ineligible"));
    }
}
