//! In-process harness: a client transport wired straight into a server
//! engine, plus handles for poking at server state from tests.

use std::sync::Arc;

use cachet_client::transport::TransportResult;
use cachet_client::{Config, Endpoint, Transport, TransportError, VaultStrategy};
use cachet_proto::wire::{
    ActivationRequest, ActivationResponse, ChallengeRequest, ChallengeResponse, EnrolRequest,
    EnrolResponse, Envelope, Inbox, MessageResponse, PeerInfo, SendResponse,
};
use cachet_server::{
    ActivationMailer, MemoryMailer, MemoryStorage, ServerEngine, ServerKeys, ServerPolicy, Storage,
};

/// A relay server plus the handles tests use to drive and inspect it.
pub struct World {
    pub engine: Arc<ServerEngine<MemoryStorage>>,
    pub storage: MemoryStorage,
    pub mailer: Arc<MemoryMailer>,
}

impl World {
    /// Stand up a server with an easy proof-of-work setting.
    pub fn new() -> Self {
        let storage = MemoryStorage::new();
        let mailer = Arc::new(MemoryMailer::new());

        let policy = ServerPolicy {
            challenge_bits: 8,
            ..ServerPolicy::default()
        };

        let engine = Arc::new(ServerEngine::new(
            ServerKeys::generate(),
            policy,
            storage.clone(),
            Arc::clone(&mailer) as Arc<dyn ActivationMailer>,
        ));

        Self {
            engine,
            storage,
            mailer,
        }
    }

    pub fn transport(&self) -> LocalTransport {
        LocalTransport {
            engine: Arc::clone(&self.engine),
        }
    }

    /// Enrol and activate an alias end-to-end, returning its endpoint.
    pub fn activated_endpoint(&self, alias: &str) -> Endpoint {
        let transport = self.transport();

        let mut endpoint =
            Endpoint::create(alias, "https://relay.example.com", VaultStrategy::Clear).unwrap();
        let activated = endpoint.enrol(&transport).unwrap();
        assert!(!activated, "fresh enrolment should require activation");

        let notice = self
            .mailer
            .last_for(alias)
            .expect("enrolment should dispatch an activation notice");
        endpoint
            .activate(&transport, &notice.token, notice.code)
            .unwrap();

        endpoint
    }

    /// A config whose default endpoint is a freshly activated alias.
    #[allow(dead_code)]
    pub fn activated_config(&self, alias: &str, store: &std::path::Path) -> Config {
        let mut config = Config::load(store).unwrap();
        config.endpoints.push(self.activated_endpoint(alias));
        config.touch();
        config
    }

    /// The peer id the server assigned to an alias.
    #[allow(dead_code)]
    pub fn peer_id(&self, alias: &str) -> uuid::Uuid {
        self.storage
            .peer_by_alias(self.engine.keys().server_id(), alias)
            .unwrap()
            .expect("peer should exist")
            .peer
    }
}

/// Client transport that calls the server engine in-process.
///
/// Plays the role of the HTTP layer: it attaches the bearer token,
/// renders engine errors as status codes, and renders the empty inbox
/// as "no content".
pub struct LocalTransport {
    engine: Arc<ServerEngine<MemoryStorage>>,
}

fn status<T>(result: cachet_server::Result<T>) -> TransportResult<T> {
    result.map_err(|e| TransportError::Status {
        status: e.status(),
        message: e.to_string(),
    })
}

impl LocalTransport {
    fn authenticate(&self, token: &str) -> TransportResult<cachet_server::PeerRecord> {
        status(self.engine.authenticate(token))
    }
}

impl Transport for LocalTransport {
    fn get_challenge(&self) -> TransportResult<ChallengeRequest> {
        status(self.engine.challenge())
    }

    fn enrol(
        &self,
        alias: &str,
        solution: &ChallengeResponse,
        request: &EnrolRequest,
    ) -> TransportResult<EnrolResponse> {
        status(self.engine.enrol(alias, solution, request))
    }

    fn activate(&self, request: &ActivationRequest) -> TransportResult<ActivationResponse> {
        status(self.engine.activate(request))
    }

    fn get_peer(&self, token: &str, alias: &str) -> TransportResult<PeerInfo> {
        let auth = self.authenticate(token)?;
        status(self.engine.peer(&auth, alias))
    }

    fn get_inbox(&self, token: &str) -> TransportResult<Option<Inbox>> {
        let auth = self.authenticate(token)?;
        status(self.engine.inbox(&auth))
    }

    fn post_message(
        &self,
        token: &str,
        recipient: &str,
        envelope: &Envelope,
    ) -> TransportResult<SendResponse> {
        let auth = self.authenticate(token)?;
        status(self.engine.send(&auth, recipient, envelope))
    }

    fn get_message(&self, token: &str, id: &str) -> TransportResult<MessageResponse> {
        let auth = self.authenticate(token)?;
        status(self.engine.message(&auth, id))
    }

    fn delete_message(&self, token: &str, id: &str) -> TransportResult<()> {
        let auth = self.authenticate(token)?;
        status(self.engine.delete(&auth, id))
    }

    fn invite(&self, token: &str, alias: &str) -> TransportResult<()> {
        let auth = self.authenticate(token)?;
        status(self.engine.invite(&auth, alias))
    }
}
