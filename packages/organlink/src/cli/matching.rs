use super::{report, Commands};
use crate::{
    api::ApiClient,
    error::Error,
    feedback::{Feedback, Level},
    matching::{MatchingWorkspace, SearchResults, Tab},
    model::{IncomingMatch, MatchRequest},
    session::{Portal, Session, TokenStore},
    OrganLinkConfig,
};
use std::sync::Arc;

///
/// Runs a matching command against the hospital portal
///
pub async fn run(
    command: Commands,
    config: &OrganLinkConfig,
    store: Arc<dyn TokenStore>,
) -> Result<i32, Error> {
    let session = Session::new(Portal::Hospital, store)?;

    // Fail before any request is made
    session.token()?;

    let client = ApiClient::connect(&config.api, session)?;
    let workspace = MatchingWorkspace::connect(&client);

    let result = execute(command, &workspace).await;
    workspace.close();
    result
}

async fn execute(command: Commands, workspace: &MatchingWorkspace) -> Result<i32, Error> {
    match command {
        Commands::Patients => {
            workspace.refresh_patients().await?;
            for patient in &workspace.snapshot().patients {
                let marker = if patient.is_awaiting_match() { "*" } else { " " };
                println!(
                    "{marker} {:>6}  {:<28} {:<4} {:<10} {}",
                    patient.patient_id,
                    patient.full_name,
                    patient.blood_type.as_deref().unwrap_or("-"),
                    patient.organ_needed.as_deref().unwrap_or("-"),
                    patient
                        .urgency_level
                        .map(|urgency| urgency.to_string())
                        .unwrap_or_default(),
                );
            }
            Ok(exitcode::OK)
        }

        Commands::Search { patient } => {
            workspace.refresh_patients().await?;
            let feedback = workspace.search(&patient).await;
            if let Some(results) = workspace.search_results() {
                print_results(&results);
            }
            Ok(report(&feedback))
        }

        Commands::Request {
            patient,
            donor,
            notes,
        } => {
            workspace.refresh_patients().await?;

            let feedback = workspace.search(&patient).await;
            if feedback.level != Level::Success {
                return Ok(report(&feedback));
            }

            Ok(report(&workspace.send_request(&donor, notes).await))
        }

        Commands::Incoming => {
            workspace.refresh_incoming().await?;
            let state = workspace.snapshot();
            for item in &state.incoming {
                print_incoming(item);
            }

            finish(workspace.activate_tab(Tab::Incoming).await)
        }

        Commands::Outgoing => {
            if let Some(feedback) = workspace.activate_tab(Tab::Outgoing).await {
                return Ok(report(&feedback));
            }
            for request in &workspace.snapshot().outgoing {
                print_request(request);
            }
            Ok(exitcode::OK)
        }

        Commands::Received => {
            workspace.refresh_received().await?;
            for request in &workspace.snapshot().received {
                print_request(request);
            }

            finish(workspace.activate_tab(Tab::Received).await)
        }

        Commands::Respond {
            item,
            decision,
            notes,
        } => {
            workspace.refresh_incoming().await?;
            Ok(report(&workspace.respond(&item, decision, notes).await))
        }

        Commands::Open { query } => {
            workspace.refresh_all().await?;

            if let Some(feedback) = workspace.open(&query).await {
                return Ok(report(&feedback));
            }

            let state = workspace.snapshot();
            println!("tab: {}", state.view.tab);

            if let Some(request) = &state.view.request {
                match state.focused_incoming() {
                    Some(item) => print_incoming(item),
                    None => println!("request {request} is not in the incoming list"),
                }
            }
            Ok(exitcode::OK)
        }

        Commands::Login { .. } | Commands::Logout | Commands::Notifications | Commands::Watch => {
            Ok(exitcode::USAGE)
        }
    }
}

fn finish(feedback: Option<Feedback>) -> Result<i32, Error> {
    Ok(feedback.map_or(exitcode::OK, |feedback| report(&feedback)))
}

fn print_results(results: &SearchResults) {
    println!("{} ({})", results.patient.full_name, results.patient.patient_id);

    for candidate in results.matches.visible() {
        println!(
            "  {:>6}  {:<28} {:>5.1}%  compatibility {:>5.1}  distance {:>5.1}  urgency {:>5.1}  risk {:>5.1}  {}",
            candidate.donor_id,
            candidate.display_name(),
            candidate.match_score,
            candidate.compatibility_score,
            candidate.distance_score,
            candidate.urgency_bonus,
            candidate.medical_risk_score,
            candidate.hospital_name.as_deref().unwrap_or("-"),
        );
    }

    if let Some(caption) = results.matches.caption() {
        println!("{caption}");
    }
}

fn print_incoming(item: &IncomingMatch) {
    let marker = if item.is_read { " " } else { "*" };
    let id = item.key().map(|id| id.to_string()).unwrap_or_default();
    let request = item
        .request_id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "?".to_string());

    println!(
        "{marker} {id:>6}  request {request:<6} {:<24} {:<24} {}",
        item.patient_name().unwrap_or("-"),
        item.requesting_hospital().unwrap_or("-"),
        item.status.map(|s| s.to_string()).unwrap_or_default(),
    );
}

fn print_request(request: &MatchRequest) {
    let marker = if request.is_viewed { " " } else { "*" };
    let donor = request
        .donor_id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default();

    println!(
        "{marker} {:>6}  {:<10} {:<24} donor {donor:<6} {}",
        request.request_id,
        request.status,
        request.patient_name.as_deref().unwrap_or("-"),
        request
            .response_notes
            .as_deref()
            .or(request.notes.as_deref())
            .unwrap_or(""),
    );
}
