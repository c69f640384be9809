use crate::model::{Notification, NotificationKind};
use reqwest::Url;
use std::fmt::Display;
use std::str::FromStr;

const TAB_PARAM: &str = "tab";
const REQUEST_PARAM: &str = "request";

// Only used to reuse Url's query handling
const VIEW_BASE: &str = "organlink://matching/";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Tab {
    #[default]
    Search,
    Incoming,
    Outgoing,
    Received,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Search, Tab::Incoming, Tab::Outgoing, Tab::Received];

    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Search => "search",
            Tab::Incoming => "incoming",
            Tab::Outgoing => "outgoing",
            Tab::Received => "received",
        }
    }

    /// Unknown values are the search tab
    pub fn parse(s: &str) -> Tab {
        Tab::ALL
            .into_iter()
            .find(|tab| tab.as_str().eq_ignore_ascii_case(s.trim()))
            .unwrap_or_default()
    }
}

impl FromStr for Tab {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Tab::parse(s))
    }
}

impl Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

///
/// Active tab plus the focused request, mirrored to `?tab=…&request=…`
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    pub tab: Tab,
    pub request: Option<String>,
}

impl ViewState {
    pub fn new(tab: Tab) -> Self {
        ViewState { tab, request: None }
    }

    pub fn focused(tab: Tab, request: impl Into<String>) -> Self {
        ViewState {
            tab,
            request: Some(request.into()),
        }
    }

    ///
    /// Parses a query string, with or without the leading `?`.
    /// A missing or unknown `tab` is the search tab.
    ///
    pub fn from_query(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');

        match Url::parse(VIEW_BASE) {
            Ok(mut url) => {
                url.set_query(Some(query));
                ViewState::from_url(&url)
            }
            Err(_) => ViewState::default(),
        }
    }

    pub fn from_url(url: &Url) -> Self {
        let mut tab = None;
        let mut request = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                TAB_PARAM if tab.is_none() => tab = Some(Tab::parse(&value)),
                REQUEST_PARAM if request.is_none() && !value.trim().is_empty() => {
                    request = Some(value.trim().to_string())
                }
                _ => {}
            }
        }

        ViewState {
            tab: tab.unwrap_or_default(),
            request,
        }
    }

    pub fn to_query(&self) -> String {
        match Url::parse(VIEW_BASE) {
            Ok(mut url) => {
                self.apply_to(&mut url);
                url.query().unwrap_or_default().to_string()
            }
            Err(_) => format!("{TAB_PARAM}={}", self.tab),
        }
    }

    ///
    /// Writes the view into `url`, replacing any `tab` and `request` and keeping other parameters
    ///
    pub fn apply_to(&self, url: &mut Url) {
        let others: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != TAB_PARAM && key != REQUEST_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        pairs.extend_pairs(others);
        pairs.append_pair(TAB_PARAM, self.tab.as_str());
        if let Some(request) = &self.request {
            pairs.append_pair(REQUEST_PARAM, request);
        }
    }

    pub fn clear_request(&mut self) {
        self.request = None;
    }

    ///
    /// Where a notification leads in the matching view.
    ///
    /// Match requests focus the request on the incoming tab, answers to our requests open
    /// the outgoing tab and new matches open the search tab. Other notifications have no view here.
    ///
    pub fn for_notification(notification: &Notification) -> Option<ViewState> {
        match notification.kind {
            NotificationKind::MatchRequest => Some(match notification.request_id() {
                Some(request_id) => ViewState::focused(Tab::Incoming, request_id.to_string()),
                None => ViewState::new(Tab::Incoming),
            }),
            NotificationKind::MatchAccepted
            | NotificationKind::MatchRejected
            | NotificationKind::MatchCompleted => Some(ViewState::new(Tab::Outgoing)),
            NotificationKind::MatchFound => Some(ViewState::new(Tab::Search)),
            NotificationKind::Policy | NotificationKind::System | NotificationKind::Other => None,
        }
    }
}
