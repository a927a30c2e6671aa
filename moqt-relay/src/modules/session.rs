use moqt_core::{
    errors::RelayError,
    models::{
        session_parameters::SessionParameters,
        subscriptions::{SessionId, SubscribeId},
        tracks::{FullTrackName, TrackAlias},
    },
};
use std::collections::HashMap;

/// Per-session state: negotiated parameters, the session's track alias
/// table and its open requests and subscriptions.
#[derive(Debug)]
pub struct SessionContext {
    session_id: SessionId,
    parameters: SessionParameters,
    track_aliases: HashMap<FullTrackName, TrackAlias>,
    next_track_alias: TrackAlias,
    outstanding_requests: u64,
    subscriptions: Vec<(FullTrackName, SubscribeId)>,
}

impl SessionContext {
    pub fn new(session_id: SessionId, parameters: SessionParameters) -> Self {
        Self {
            session_id,
            parameters,
            track_aliases: HashMap::new(),
            next_track_alias: 0,
            outstanding_requests: 0,
            subscriptions: Vec::new(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn parameters(&self) -> &SessionParameters {
        &self.parameters
    }

    /// The session's alias for a track. Stable: asking again for the same
    /// track returns the same alias for the lifetime of the session.
    pub fn alias_for(&mut self, track: &FullTrackName) -> TrackAlias {
        if let Some(alias) = self.track_aliases.get(track) {
            return *alias;
        }

        let alias = self.next_track_alias;
        self.next_track_alias += 1;
        self.track_aliases.insert(track.clone(), alias);
        alias
    }

    /// Admits one more concurrent request, refusing beyond the negotiated
    /// `max_request_id`.
    pub fn begin_request(&mut self) -> Result<(), RelayError> {
        if self.outstanding_requests >= self.parameters.max_request_id() {
            return Err(RelayError::ProtocolViolation(format!(
                "request limit ({}) exceeded",
                self.parameters.max_request_id()
            )));
        }

        self.outstanding_requests += 1;
        Ok(())
    }

    pub fn end_request(&mut self) {
        self.outstanding_requests = self.outstanding_requests.saturating_sub(1);
    }

    pub fn record_subscription(&mut self, track: FullTrackName, subscribe_id: SubscribeId) {
        self.subscriptions.push((track, subscribe_id));
    }

    pub fn forget_subscription(&mut self, track: &FullTrackName, subscribe_id: SubscribeId) {
        self.subscriptions
            .retain(|(t, id)| !(t == track && *id == subscribe_id));
    }

    pub fn subscriptions(&self) -> &[(FullTrackName, SubscribeId)] {
        &self.subscriptions
    }
}

/// Owner of every connected session's context.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, SessionContext>,
    next_session_id: SessionId,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, parameters: SessionParameters) -> SessionId {
        let session_id = self.next_session_id;
        self.next_session_id += 1;
        self.sessions
            .insert(session_id, SessionContext::new(session_id, parameters));
        session_id
    }

    pub fn get(&self, session_id: SessionId) -> Option<&SessionContext> {
        self.sessions.get(&session_id)
    }

    pub fn get_mut(&mut self, session_id: SessionId) -> Option<&mut SessionContext> {
        self.sessions.get_mut(&session_id)
    }

    /// The removed context is handed back so the caller can tear down
    /// whatever the session still owned.
    pub fn remove(&mut self, session_id: SessionId) -> Option<SessionContext> {
        self.sessions.remove(&session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod success {
    use crate::modules::session::{SessionContext, SessionRegistry};
    use moqt_core::models::{
        session_parameters::SessionParameters,
        tracks::{FullTrackName, TrackNamespace},
    };

    fn track(name: &str) -> FullTrackName {
        FullTrackName::new(TrackNamespace::from(vec!["example"]), name.to_string())
    }

    #[test]
    fn alias_is_stable_per_track() {
        let mut session = SessionContext::new(1, SessionParameters::default());

        let video = session.alias_for(&track("video"));
        let audio = session.alias_for(&track("audio"));

        assert_ne!(video, audio);
        assert_eq!(session.alias_for(&track("video")), video);
        assert_eq!(session.alias_for(&track("audio")), audio);
    }

    #[test]
    fn request_accounting() {
        let mut session = SessionContext::new(1, SessionParameters::default());

        session.begin_request().unwrap();
        session.begin_request().unwrap();
        session.end_request();
        session.end_request();
        // Does not underflow
        session.end_request();

        assert!(session.begin_request().is_ok());
    }

    #[test]
    fn subscription_bookkeeping() {
        let mut session = SessionContext::new(1, SessionParameters::default());
        session.record_subscription(track("video"), 1);
        session.record_subscription(track("audio"), 2);

        session.forget_subscription(&track("video"), 1);

        assert_eq!(session.subscriptions(), &[(track("audio"), 2)]);
    }

    #[test]
    fn registry_assigns_distinct_ids() {
        let mut registry = SessionRegistry::new();

        let first = registry.add(SessionParameters::default());
        let second = registry.add(SessionParameters::default());

        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);

        let removed = registry.remove(first);
        assert_eq!(removed.map(|s| s.session_id()), Some(first));
        assert!(registry.get(first).is_none());
        assert_eq!(registry.len(), 1);
    }
}
