use super::{
    HospitalMatching, MatchResponse, MatchingService, SearchResults, SendMatchRequest, Tab,
    ViewState,
};
use crate::api::ApiClient;
use crate::error::{ApiError, Error};
use crate::feedback::Feedback;
use crate::log::MATCHING;
use crate::model::{
    awaiting_match, Decision, EntityId, IncomingMatch, MatchRequest, Notification, Patient,
};
use crate::prometheus::{MATCH_REQUESTS_SENT_TOTAL, MATCH_RESPONSES_TOTAL, MATCH_SEARCHES_TOTAL};
use metrics::counter;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

///
/// What the matching view shows
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkspaceState {
    pub view: ViewState,
    pub patients: Vec<Patient>,
    pub search: Option<SearchResults>,
    pub incoming: Vec<IncomingMatch>,
    pub outgoing: Vec<MatchRequest>,
    pub received: Vec<MatchRequest>,
}

impl WorkspaceState {
    pub fn searchable_patients(&self) -> Vec<&Patient> {
        awaiting_match(&self.patients)
    }

    pub fn unread_incoming(&self) -> usize {
        self.incoming.iter().filter(|item| !item.is_read).count()
    }

    pub fn unviewed_received(&self) -> usize {
        self.received.iter().filter(|r| !r.is_viewed).count()
    }

    /// The incoming entry named by the `request` query parameter
    pub fn focused_incoming(&self) -> Option<&IncomingMatch> {
        let request = EntityId::from(self.view.request.as_deref()?);
        self.incoming
            .iter()
            .find(|item| item.is_identified_by(&request))
    }
}

///
/// Ids with an action in flight. Membership is held by an `InFlightGuard` and released on drop,
/// whatever the outcome of the action.
///
#[derive(Debug, Default)]
struct InFlight {
    ids: Arc<Mutex<HashSet<EntityId>>>,
}

struct InFlightGuard {
    ids: Arc<Mutex<HashSet<EntityId>>>,
    id: EntityId,
}

impl InFlight {
    fn acquire(&self, id: &EntityId) -> Option<InFlightGuard> {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        ids.insert(id.clone()).then(|| InFlightGuard {
            ids: self.ids.clone(),
            id: id.clone(),
        })
    }

    fn contains(&self, id: &EntityId) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

///
/// The hospital matching workflow: search, send, respond and the four tabs.
///
/// Every action returns `Feedback` for the user and leaves the state as it was when it fails.
/// State is replaced only with data fetched from the server.
///
/// Closing (or dropping) the workspace cancels requests in flight. Results arriving after
/// close are discarded.
///
pub struct MatchingWorkspace {
    service: Arc<dyn MatchingService>,
    state: RwLock<WorkspaceState>,
    sending: InFlight,
    responding: InFlight,
    cancel: CancellationToken,
}

impl MatchingWorkspace {
    pub fn new(service: Arc<dyn MatchingService>) -> Self {
        MatchingWorkspace::with_cancellation(service, CancellationToken::new())
    }

    pub fn with_cancellation(service: Arc<dyn MatchingService>, cancel: CancellationToken) -> Self {
        MatchingWorkspace {
            service,
            state: RwLock::new(WorkspaceState::default()),
            sending: InFlight::default(),
            responding: InFlight::default(),
            cancel,
        }
    }

    ///
    /// Workspace over the hospital matching endpoints.
    /// Closing the workspace also cancels the HTTP requests it started.
    ///
    pub fn connect(client: &ApiClient) -> Self {
        let cancel = client.cancellation().child_token();
        let service = HospitalMatching::new(client.with_cancellation(cancel.clone()));
        MatchingWorkspace::with_cancellation(Arc::new(service), cancel)
    }

    pub fn snapshot(&self) -> WorkspaceState {
        self.read(|state| state.clone())
    }

    pub fn view(&self) -> ViewState {
        self.read(|state| state.view.clone())
    }

    pub fn search_results(&self) -> Option<SearchResults> {
        self.read(|state| state.search.clone())
    }

    pub fn is_sending(&self, donor_id: &EntityId) -> bool {
        self.sending.contains(donor_id)
    }

    pub fn is_responding(&self, item: &EntityId) -> bool {
        self.responding.contains(item)
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn close(&self) {
        if !self.cancel.is_cancelled() {
            debug!(target: MATCHING, msg = "Closing matching workspace");
            self.cancel.cancel();
        }
    }

    pub async fn refresh_patients(&self) -> Result<(), Error> {
        let patients = self.call(self.service.patients()).await?;
        debug!(target: MATCHING, msg = "Patients loaded", count = patients.len());
        self.store(|state| state.patients = patients)
    }

    pub async fn refresh_incoming(&self) -> Result<(), Error> {
        let incoming = self.call(self.service.incoming_matches()).await?;
        debug!(target: MATCHING, msg = "Incoming matches loaded", count = incoming.len());
        self.store(|state| state.incoming = incoming)
    }

    pub async fn refresh_outgoing(&self) -> Result<(), Error> {
        let outgoing = self.call(self.service.outgoing_requests()).await?;
        debug!(target: MATCHING, msg = "Outgoing requests loaded", count = outgoing.len());
        self.store(|state| state.outgoing = outgoing)
    }

    pub async fn refresh_received(&self) -> Result<(), Error> {
        let received = self.call(self.service.received_requests()).await?;
        debug!(target: MATCHING, msg = "Received requests loaded", count = received.len());
        self.store(|state| state.received = received)
    }

    pub async fn refresh_all(&self) -> Result<(), Error> {
        tokio::try_join!(
            self.refresh_patients(),
            self.refresh_incoming(),
            self.refresh_outgoing(),
            self.refresh_received(),
        )?;
        Ok(())
    }

    ///
    /// Fetches donor matches for a waiting patient, replacing any previous results
    ///
    pub async fn search(&self, patient_id: &EntityId) -> Feedback {
        let patient = self.read(|state| {
            state
                .patients
                .iter()
                .find(|p| &p.patient_id == patient_id)
                .cloned()
        });

        let Some(patient) = patient else {
            return Feedback::warning(format!("Patient {patient_id} not found"));
        };

        if !patient.is_awaiting_match() {
            return Feedback::warning(format!(
                "{} is not waiting for a match",
                patient.full_name
            ));
        }

        counter!(MATCH_SEARCHES_TOTAL).increment(1);
        debug!(target: MATCHING, msg = "Searching donor matches", patient_id = %patient_id);

        let response = match self.call(self.service.enhanced_matches(patient_id)).await {
            Ok(response) => response,
            Err(err) => return self.failed("Match search failed", &err),
        };

        let results = SearchResults::new(patient, response);
        let feedback = results.feedback();

        match self.store(|state| state.search = Some(results)) {
            Ok(()) => feedback,
            Err(err) => self.failed("Match search failed", &err),
        }
    }

    ///
    /// Sends a match request for a donor in the current search results.
    ///
    /// Only that donor is marked in flight while the request is sent. On success the view moves
    /// to the outgoing tab and patients, outgoing and received lists are re-fetched.
    ///
    pub async fn send_request(&self, donor_id: &EntityId, notes: Option<String>) -> Feedback {
        let target = self.read(|state| {
            state.search.as_ref().map(|search| {
                (
                    search.patient.clone(),
                    search.matches.find(donor_id).cloned(),
                )
            })
        });

        let (patient, candidate) = match target {
            None => return Feedback::warning("Search for donor matches before sending a request"),
            Some((_, None)) => {
                return Feedback::warning(format!(
                    "Donor {donor_id} is not among the current matches"
                ))
            }
            Some((patient, Some(candidate))) => (patient, candidate),
        };

        let Some(guard) = self.sending.acquire(donor_id) else {
            return Feedback::warning("A match request for this donor is already being sent");
        };

        let request = SendMatchRequest {
            patient_id: patient.patient_id.clone(),
            donor_id: donor_id.clone(),
            donor_hospital_id: candidate.hospital_id.clone(),
            notes: notes.unwrap_or_default(),
        };

        let result = self.call(self.service.send_request(&request)).await;
        drop(guard);

        let ack = match result {
            Ok(ack) => ack,
            Err(err) => return self.failed("Match request failed", &err),
        };

        counter!(MATCH_REQUESTS_SENT_TOTAL).increment(1);
        info!(
            target: MATCHING,
            msg = "Match request sent",
            patient_id = %request.patient_id,
            donor_id = %request.donor_id
        );

        if let Err(err) = self.store(|state| state.view = ViewState::new(Tab::Outgoing)) {
            return self.failed("Match request sent", &err);
        }

        let refreshed = tokio::join!(
            self.refresh_patients(),
            self.refresh_outgoing(),
            self.refresh_received(),
        );
        self.refresh_failures(
            "List not refreshed after sending a match request",
            [refreshed.0, refreshed.1, refreshed.2],
        );

        let message = ack
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| format!("Match request sent for {}", candidate.display_name()));

        Feedback::success(message)
    }

    ///
    /// Accepts or declines an incoming match request.
    ///
    /// `item` is the incoming entry's id or its match request id. On success the source
    /// notification is marked read, the focused request is cleared and incoming, received
    /// and outgoing lists are re-fetched.
    ///
    pub async fn respond(
        &self,
        item: &EntityId,
        decision: Decision,
        notes: Option<String>,
    ) -> Feedback {
        let incoming = self.read(|state| {
            state
                .incoming
                .iter()
                .find(|incoming| incoming.is_identified_by(item))
                .cloned()
        });

        let Some(incoming) = incoming else {
            return Feedback::warning(format!("Incoming match {item} not found"));
        };

        let Some(request_id) = incoming.request_id() else {
            let err = ApiError::MissingIdentifier {
                item: item.to_string(),
            };
            return self.failed("Match response failed", &err.into());
        };

        if let Some(status) = incoming.status {
            if let Err(err) = status.transition(decision.status()) {
                return Feedback::warning(err.to_string());
            }
        }

        let key = incoming.key().unwrap_or_else(|| request_id.clone());

        let Some(guard) = self.responding.acquire(&key) else {
            return Feedback::warning("A response to this request is already being sent");
        };

        let response = MatchResponse {
            status: decision.status(),
            response_notes: notes.unwrap_or_default(),
        };

        let result = self.call(self.service.respond(&request_id, &response)).await;
        drop(guard);

        if let Err(err) = result {
            return self.failed("Match response failed", &err);
        }

        counter!(MATCH_RESPONSES_TOTAL, "status" => decision.status().as_str()).increment(1);
        info!(
            target: MATCHING,
            msg = "Match request answered",
            request_id = %request_id,
            status = %decision.status()
        );

        if let Some(notification_id) = incoming.source_notification() {
            if let Err(err) = self
                .call(self.service.mark_notification_read(&notification_id))
                .await
            {
                self.secondary_failure("Notification not marked read", &err);
            }
        }

        if let Err(err) = self.store(|state| state.view.clear_request()) {
            return self.failed("Match response sent", &err);
        }

        let refreshed = tokio::join!(
            self.refresh_incoming(),
            self.refresh_received(),
            self.refresh_outgoing(),
        );
        self.refresh_failures(
            "List not refreshed after answering a match request",
            [refreshed.0, refreshed.1, refreshed.2],
        );

        Feedback::success(format!("Match request {}", decision.past_tense()))
    }

    pub async fn activate_tab(&self, tab: Tab) -> Option<Feedback> {
        self.navigate(ViewState::new(tab)).await
    }

    ///
    /// Restores the view from a `?tab=…&request=…` query
    ///
    pub async fn open(&self, query: &str) -> Option<Feedback> {
        self.navigate(ViewState::from_query(query)).await
    }

    pub async fn open_notification(&self, notification: &Notification) -> Option<Feedback> {
        match ViewState::for_notification(notification) {
            Some(view) => self.navigate(view).await,
            None => Some(Feedback::info(
                "This notification has nothing to show in matching",
            )),
        }
    }

    ///
    /// Switches the view and runs the tab's activation.
    ///
    /// Incoming marks every unread entry read and received marks every unviewed request
    /// viewed, each followed by a re-fetch. Outgoing and search re-fetch their list.
    ///
    pub async fn navigate(&self, view: ViewState) -> Option<Feedback> {
        let tab = view.tab;

        if self.store(|state| state.view = view).is_err() {
            return None;
        }

        let result = match tab {
            Tab::Search => self.refresh_patients().await,
            Tab::Incoming => self.mark_incoming_read().await,
            Tab::Outgoing => self.refresh_outgoing().await,
            Tab::Received => self.mark_received_viewed().await,
        };

        match result {
            Ok(()) => None,
            Err(err) if err.is_cancelled() => None,
            Err(err) => Some(self.failed(&format!("Could not load the {tab} tab"), &err)),
        }
    }

    async fn mark_incoming_read(&self) -> Result<(), Error> {
        let unread: Vec<EntityId> = self.read(|state| {
            state
                .incoming
                .iter()
                .filter(|item| !item.is_read)
                .filter_map(IncomingMatch::source_notification)
                .collect()
        });

        for notification_id in &unread {
            if let Err(err) = self
                .call(self.service.mark_notification_read(notification_id))
                .await
            {
                if err.is_cancelled() {
                    return Err(err);
                }
                self.secondary_failure("Incoming match not marked read", &err);
            }
        }

        debug!(target: MATCHING, msg = "Incoming matches marked read", count = unread.len());
        self.refresh_incoming().await
    }

    async fn mark_received_viewed(&self) -> Result<(), Error> {
        let unviewed: Vec<EntityId> = self.read(|state| {
            state
                .received
                .iter()
                .filter(|r| !r.is_viewed)
                .map(|r| r.request_id.clone())
                .collect()
        });

        if !unviewed.is_empty() {
            if let Err(err) = self
                .call(self.service.mark_received_viewed(&unviewed))
                .await
            {
                if err.is_cancelled() {
                    return Err(err);
                }
                self.secondary_failure("Received requests not marked viewed", &err);
            }
            debug!(target: MATCHING, msg = "Received requests marked viewed", count = unviewed.len());
        }

        self.refresh_received().await
    }

    async fn call<T>(&self, future: impl Future<Output = Result<T, Error>>) -> Result<T, Error> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = future => result,
        }
    }

    fn read<T>(&self, f: impl FnOnce(&WorkspaceState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Applies `f` unless the workspace has been closed
    fn store(&self, f: impl FnOnce(&mut WorkspaceState)) -> Result<(), Error> {
        if self.cancel.is_cancelled() {
            debug!(target: MATCHING, msg = "Workspace closed, update discarded");
            return Err(Error::Cancelled);
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
        Ok(())
    }

    fn failed(&self, action: &str, err: &Error) -> Feedback {
        if !err.is_cancelled() {
            warn!(target: MATCHING, msg = action, error = err.to_string());
        }
        Feedback::from_error(err)
    }

    // Each list refreshes independently, one failure does not skip the others
    fn refresh_failures<const N: usize>(&self, action: &str, results: [Result<(), Error>; N]) {
        for err in results.iter().filter_map(|result| result.as_ref().err()) {
            self.secondary_failure(action, err);
        }
    }

    // Failures after the primary action succeeded are logged only
    fn secondary_failure(&self, action: &str, err: &Error) {
        if err.is_cancelled() {
            debug!(target: MATCHING, msg = action, error = err.to_string());
        } else {
            warn!(target: MATCHING, msg = action, error = err.to_string());
        }
    }
}

impl Drop for MatchingWorkspace {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for MatchingWorkspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchingWorkspace")
            .field("view", &self.view())
            .field("closed", &self.is_closed())
            .finish()
    }
}
