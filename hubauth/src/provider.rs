use std::{
    error, fmt,
    sync::{Arc, Weak},
    time::Duration,
};

use hubauth_clock::{Clock, DurationSecs, System, UnixTime};
use parking_lot::Mutex;
use tokio::{runtime::Handle, task::JoinHandle, time::Instant};

use crate::{
    error::{FromConnectionStringError, NoRuntime, ProviderError, RenewalFailure, SigningError},
    events::{AuthenticationEvent, AuthenticationEvents, Publisher},
    signature::{self, SharedAccessKeySigner, TokenSigner},
    ConnectionString, DeviceCredentials, DeviceIdentity, TokenLifetimeConfig, TokenWindow,
};

/// The kind of credentials an authentication provider hands out
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AuthenticationType {
    /// Time-limited signed tokens
    Token,
}

/// A source of credentials for a transport
///
/// Transports pull credentials when connecting and subscribe to learn about
/// renewed credentials so they can re-authenticate without dropping their session.
pub trait AuthenticationProvider {
    /// The error type returned in the event that credentials cannot be produced
    type Error: error::Error + Send + Sync + 'static;

    /// The kind of credentials this provider hands out
    fn authentication_type(&self) -> AuthenticationType;

    /// Gets the current credentials
    fn get_device_credentials(&self) -> Result<DeviceCredentials, Self::Error>;

    /// Subscribes to events published by this provider
    fn subscribe(&self) -> AuthenticationEvents;
}

/// An authentication provider that signs tokens with a shared access key
///
/// On construction, the first token is signed. A renewal is then scheduled for when
/// only the renewal margin of the token's validity remains, and each renewal schedules
/// its successor. Every renewal publishes an
/// [`AuthenticationEvent::NewTokenAvailable`] to subscribers.
///
/// If a scheduled renewal is delayed, for example because the host was suspended,
/// [`get_device_credentials`][Self::get_device_credentials] notices the stale token
/// and renews it before returning.
///
/// Dropping the provider cancels any pending renewal.
pub struct SharedAccessKeyAuthenticationProvider<S = SharedAccessKeySigner, C = System> {
    inner: Arc<Inner<S, C>>,
}

struct Inner<S, C> {
    identity: DeviceIdentity,
    lifetime: TokenLifetimeConfig,
    signer: S,
    clock: C,
    runtime: Handle,
    publisher: Publisher,
    state: Mutex<RenewalState>,
}

#[derive(Default)]
struct RenewalState {
    window: Option<TokenWindow>,
    pending: Option<PendingRenewal>,
    generation: u64,
}

struct PendingRenewal {
    due: UnixTime,
    handle: JoinHandle<()>,
}

impl PendingRenewal {
    fn cancel(self) {
        self.handle.abort();
    }
}

#[derive(Clone, Copy, Debug)]
enum RenewalTrigger {
    Initial,
    Scheduled,
    StaleRead,
}

impl SharedAccessKeyAuthenticationProvider {
    /// Constructs a new provider using the system clock
    ///
    /// Must be called from within a tokio runtime, which will be used to
    /// schedule renewals.
    pub fn new(
        identity: DeviceIdentity,
        lifetime: TokenLifetimeConfig,
    ) -> Result<Self, ProviderError<SigningError>> {
        Self::with_signer_and_clock(identity, lifetime, SharedAccessKeySigner, System)
    }

    /// Constructs a new provider from optional lifetime overrides, in seconds
    ///
    /// An absent or zero value uses the default from [`TokenLifetimeConfig`].
    pub fn with_lifetime_secs(
        identity: DeviceIdentity,
        valid_duration: Option<u64>,
        renewal_margin: Option<u64>,
    ) -> Result<Self, ProviderError<SigningError>> {
        let lifetime = TokenLifetimeConfig::from_optional_secs(valid_duration, renewal_margin)?;
        Self::new(identity, lifetime)
    }

    /// Constructs a new provider from a device connection string
    ///
    /// The connection string must contain `HostName`, `DeviceId`, and
    /// `SharedAccessKey`. Lifetime overrides behave as in
    /// [`with_lifetime_secs`][Self::with_lifetime_secs].
    pub fn from_connection_string(
        connection_string: &str,
        valid_duration: Option<u64>,
        renewal_margin: Option<u64>,
    ) -> Result<Self, FromConnectionStringError> {
        let identity = ConnectionString::parse(connection_string)?.device_identity()?;
        let lifetime = TokenLifetimeConfig::from_optional_secs(valid_duration, renewal_margin)?;
        Ok(Self::new(identity, lifetime)?)
    }
}

impl<S, C> SharedAccessKeyAuthenticationProvider<S, C>
where
    S: TokenSigner + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Constructs a new provider using the given signer and clock
    pub fn with_signer_and_clock(
        identity: DeviceIdentity,
        lifetime: TokenLifetimeConfig,
        signer: S,
        clock: C,
    ) -> Result<Self, ProviderError<S::Error>> {
        let runtime = Handle::try_current().map_err(NoRuntime::from)?;

        let inner = Arc::new(Inner {
            identity,
            lifetime,
            signer,
            clock,
            runtime,
            publisher: Publisher::new(),
            state: Mutex::new(RenewalState::default()),
        });

        {
            let mut state = inner.state.lock();
            inner
                .renew(&mut state, RenewalTrigger::Initial)
                .map_err(ProviderError::Signing)?;
        }

        Ok(Self { inner })
    }

    /// Gets the current credentials, renewing the token first if it is stale
    ///
    /// A token is stale once less than the renewal margin remains before it
    /// expires. Signing failures during that renewal are returned as is.
    pub fn get_device_credentials(&self) -> Result<DeviceCredentials, S::Error> {
        let mut state = self.inner.state.lock();
        let now = self.inner.clock.now();

        if let Some(window) = state
            .window
            .as_ref()
            .filter(|w| !w.needs_renewal_at(now))
        {
            tracing::trace!(
                expiry = window.expiry().0,
                remaining = window.until_expired_at(now).0,
                "token still fresh"
            );
            return Ok(DeviceCredentials::new(&self.inner.identity, window.token()));
        }

        self.inner.renew(&mut state, RenewalTrigger::StaleRead)
    }

    /// Subscribes to events published by this provider
    ///
    /// Only events published after subscribing are received.
    pub fn subscribe(&self) -> AuthenticationEvents {
        self.inner.publisher.subscribe()
    }

    /// The kind of credentials this provider hands out
    #[inline]
    pub fn authentication_type(&self) -> AuthenticationType {
        AuthenticationType::Token
    }

    /// The identity tokens are signed for
    #[inline]
    pub fn identity(&self) -> &DeviceIdentity {
        &self.inner.identity
    }

    /// The lifetime configuration used for each token
    #[inline]
    pub fn lifetime(&self) -> &TokenLifetimeConfig {
        &self.inner.lifetime
    }

    /// The time at which the next scheduled renewal is due
    ///
    /// `None` if the last scheduled renewal failed and nothing has renewed the
    /// token since.
    pub fn next_renewal(&self) -> Option<UnixTime> {
        self.inner.state.lock().pending.as_ref().map(|p| p.due)
    }
}

impl<S, C> AuthenticationProvider for SharedAccessKeyAuthenticationProvider<S, C>
where
    S: TokenSigner + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    type Error = S::Error;

    fn authentication_type(&self) -> AuthenticationType {
        SharedAccessKeyAuthenticationProvider::authentication_type(self)
    }

    fn get_device_credentials(&self) -> Result<DeviceCredentials, Self::Error> {
        SharedAccessKeyAuthenticationProvider::get_device_credentials(self)
    }

    fn subscribe(&self) -> AuthenticationEvents {
        SharedAccessKeyAuthenticationProvider::subscribe(self)
    }
}

impl<S, C> fmt::Debug for SharedAccessKeyAuthenticationProvider<S, C>
where
    S: fmt::Debug,
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("SharedAccessKeyAuthenticationProvider")
            .field("identity", &self.inner.identity)
            .field("lifetime", &self.inner.lifetime)
            .field("signer", &self.inner.signer)
            .field("clock", &self.inner.clock)
            .field("expiry", &state.window.as_ref().map(|w| w.expiry()))
            .field("next_renewal", &state.pending.as_ref().map(|p| p.due))
            .finish()
    }
}

impl<S, C> Inner<S, C>
where
    S: TokenSigner + Send + Sync + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Signs a new token, replaces the pending renewal, and publishes the result
    ///
    /// Must be called with the state lock held. On failure, the current token and
    /// any pending renewal are left as they were.
    fn renew(
        self: &Arc<Self>,
        state: &mut RenewalState,
        trigger: RenewalTrigger,
    ) -> Result<DeviceCredentials, S::Error> {
        let issued = self.clock.now();
        let expiry = issued + self.lifetime.valid_duration();
        let resource_uri =
            signature::resource_uri(self.identity.host(), self.identity.device_id());

        let token = self.signer.sign(
            &resource_uri,
            self.identity.shared_access_key_name(),
            self.identity.shared_access_key(),
            expiry,
        )?;

        let window = self.lifetime.window(token, issued);
        let credentials = DeviceCredentials::new(&self.identity, window.token());
        state.window = Some(window);

        if let Some(pending) = state.pending.take() {
            pending.cancel();
        }
        let due = self.schedule(state, issued);

        tracing::debug!(
            ?trigger,
            device_id = %self.identity.device_id(),
            expiry = expiry.0,
            next_renewal = due.0,
            "renewed token"
        );

        self.publisher
            .publish(AuthenticationEvent::NewTokenAvailable(credentials.clone()));

        Ok(credentials)
    }

    fn schedule(self: &Arc<Self>, state: &mut RenewalState, issued: UnixTime) -> UnixTime {
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;

        let interval = self.lifetime.renewal_interval();
        let deadline = renewal_deadline(Instant::now(), interval);
        let weak: Weak<Self> = Arc::downgrade(self);

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                inner.renew_scheduled(generation);
            }
        });

        let due = issued + interval;
        state.pending = Some(PendingRenewal { due, handle });
        due
    }

    fn renew_scheduled(self: &Arc<Self>, generation: u64) {
        let mut state = self.state.lock();

        if state.generation != generation {
            tracing::trace!(
                generation,
                current = state.generation,
                "scheduled renewal was superseded"
            );
            return;
        }

        // The pending handle belongs to the task running this renewal
        state.pending = None;

        if let Err(error) = self.renew(&mut state, RenewalTrigger::Scheduled) {
            tracing::warn!(
                error = (&error as &dyn error::Error),
                device_id = %self.identity.device_id(),
                "scheduled token renewal failed"
            );
            let failure: RenewalFailure = Arc::new(error);
            self.publisher
                .publish(AuthenticationEvent::RenewalFailed(failure));
        }
    }
}

/// Roughly 30 years, the furthest out a renewal timer is ever set
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn renewal_deadline(now: Instant, interval: DurationSecs) -> Instant {
    let interval = Duration::from(interval).min(FAR_FUTURE);
    now.checked_add(interval).unwrap_or(now)
}

impl<S, C> Drop for Inner<S, C> {
    fn drop(&mut self) {
        if let Some(pending) = self.state.get_mut().pending.take() {
            tracing::info!(
                device_id = %self.identity.device_id(),
                "authentication provider dropped, cancelling pending renewal"
            );
            pending.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use color_eyre::Result;
    use hubauth_clock::TestClock;
    use thiserror::Error;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};
    use tracing_test::traced_test;

    use super::*;
    use crate::{
        DeviceId, HostName, SharedAccessKey, SharedAccessKeyNameRef, SharedAccessKeyRef,
        SharedAccessSignature,
    };

    const START: UnixTime = UnixTime(0);

    #[derive(Debug, Error)]
    #[error("signing refused")]
    struct Refused;

    #[derive(Clone, Debug, Default)]
    struct CountingSigner {
        calls: Arc<AtomicUsize>,
        fail: Arc<AtomicBool>,
    }

    impl CountingSigner {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn fail(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }
    }

    impl TokenSigner for CountingSigner {
        type Error = Refused;

        fn sign(
            &self,
            resource_uri: &str,
            _key_name: Option<&SharedAccessKeyNameRef>,
            _key: &SharedAccessKeyRef,
            expiry: UnixTime,
        ) -> Result<SharedAccessSignature, Self::Error> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Refused);
            }

            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(SharedAccessSignature::new(format!(
                "SharedAccessSignature sr={}&sig=call{}&se={}",
                resource_uri, n, expiry.0
            )))
        }
    }

    type TestProvider = SharedAccessKeyAuthenticationProvider<CountingSigner, TestClock>;

    fn identity() -> DeviceIdentity {
        DeviceIdentity::new(
            HostName::from_static("hub.example.net"),
            DeviceId::from_static("sensor-7"),
            None,
            SharedAccessKey::from_static("a2V5"),
        )
    }

    fn provider(
        lifetime: TokenLifetimeConfig,
    ) -> Result<(TestProvider, CountingSigner, TestClock)> {
        let signer = CountingSigner::default();
        let clock = TestClock::new(START);
        let provider = SharedAccessKeyAuthenticationProvider::with_signer_and_clock(
            identity(),
            lifetime,
            signer.clone(),
            clock.clone(),
        )?;
        Ok((provider, signer, clock))
    }

    fn expiry_of(creds: &DeviceCredentials) -> Option<UnixTime> {
        creds.shared_access_signature().expiry()
    }

    async fn advance(clock: &TestClock, secs: u64) {
        clock.inc(secs);
        tokio::time::advance(Duration::from_secs(secs)).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn initial_token_expires_after_valid_duration() -> Result<()> {
        let (provider, signer, _) = provider(TokenLifetimeConfig::default())?;

        let creds = provider.get_device_credentials()?;
        assert_eq!(expiry_of(&creds), Some(UnixTime(3600)));
        assert_eq!(
            creds.shared_access_signature().resource_uri(),
            Some("hub.example.net%2Fdevices%2Fsensor-7")
        );
        assert_eq!(provider.next_renewal(), Some(UnixTime(2700)));
        assert_eq!(signer.calls(), 1);
        assert_eq!(provider.authentication_type(), AuthenticationType::Token);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_read_returns_existing_token() -> Result<()> {
        let (provider, signer, clock) = provider(TokenLifetimeConfig::default())?;
        let first = provider.get_device_credentials()?;

        // exactly the renewal margin remaining
        clock.inc(2700);
        let second = provider.get_device_credentials()?;

        assert_eq!(first, second);
        assert_eq!(signer.calls(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn stale_read_renews_exactly_once() -> Result<()> {
        let (provider, signer, clock) = provider(TokenLifetimeConfig::default())?;
        let mut events = provider.subscribe();

        clock.inc(2701);
        let creds = provider.get_device_credentials()?;
        assert_eq!(expiry_of(&creds), Some(UnixTime(2701 + 3600)));
        assert_eq!(signer.calls(), 2);
        assert_eq!(provider.next_renewal(), Some(UnixTime(2701 + 2700)));

        let again = provider.get_device_credentials()?;
        assert_eq!(creds, again);
        assert_eq!(signer.calls(), 2);

        match events.try_recv()? {
            AuthenticationEvent::NewTokenAvailable(published) => assert_eq!(published, creds),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
        assert!(logs_contain("renewed token"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_renewal_fires_before_expiry() -> Result<()> {
        let (provider, signer, clock) = provider(TokenLifetimeConfig::default())?;
        let mut events = provider.subscribe();

        advance(&clock, 2699).await;
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

        advance(&clock, 1).await;
        let event = events.recv().await?;
        let creds = event.credentials().cloned().expect("new token");
        assert_eq!(expiry_of(&creds), Some(UnixTime(6300)));
        assert_eq!(provider.next_renewal(), Some(UnixTime(5400)));
        assert_eq!(signer.calls(), 2);

        // reads between renewals reuse the published token
        assert_eq!(provider.get_device_credentials()?, creds);

        advance(&clock, 2700).await;
        let event = events.recv().await?;
        assert_eq!(
            event.credentials().and_then(expiry_of),
            Some(UnixTime(9000))
        );
        assert_eq!(signer.calls(), 3);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn stale_read_replaces_pending_renewal() -> Result<()> {
        let (provider, signer, clock) = provider(TokenLifetimeConfig::default())?;
        let mut events = provider.subscribe();

        advance(&clock, 2000).await;

        // the host slept through the scheduled renewal
        clock.inc(1000);
        provider.get_device_credentials()?;
        assert_eq!(signer.calls(), 2);
        assert!(events.try_recv()?.credentials().is_some());

        // the first deadline passes without a second renewal
        tokio::time::advance(Duration::from_secs(700)).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(signer.calls(), 2);

        // only the replacement timer fires, a full interval after the stale read
        tokio::time::advance(Duration::from_secs(2000)).await;
        let event = events.recv().await?;
        assert!(event.credentials().is_some());
        assert_eq!(signer.calls(), 3);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn custom_lifetime_sets_interval() -> Result<()> {
        let lifetime = TokenLifetimeConfig::new(DurationSecs(100), DurationSecs(40))?;
        let (provider, signer, clock) = provider(lifetime)?;
        let mut events = provider.subscribe();

        assert_eq!(provider.next_renewal(), Some(UnixTime(60)));

        advance(&clock, 60).await;
        let event = events.recv().await?;
        assert_eq!(
            event.credentials().and_then(expiry_of),
            Some(UnixTime(160))
        );
        assert_eq!(signer.calls(), 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn maximal_validity_still_schedules_renewal() -> Result<()> {
        let lifetime = TokenLifetimeConfig::new(DurationSecs(u64::MAX), DurationSecs(1))?;
        let (provider, signer, clock) = provider(lifetime)?;

        assert_eq!(provider.next_renewal(), Some(UnixTime(u64::MAX - 1)));
        let creds = provider.get_device_credentials()?;
        assert_eq!(expiry_of(&creds), Some(UnixTime(u64::MAX)));

        // an expired read reschedules without overflowing either
        clock.inc(u64::MAX);
        provider.get_device_credentials()?;
        assert_eq!(signer.calls(), 2);
        assert!(provider.next_renewal().is_some());
        Ok(())
    }

    #[test]
    fn renewal_deadline_is_capped() {
        let now = Instant::now();
        assert_eq!(renewal_deadline(now, DurationSecs(60)), now + Duration::from_secs(60));
        assert_eq!(renewal_deadline(now, DurationSecs(u64::MAX)), now + FAR_FUTURE);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_failure_is_published() -> Result<()> {
        let (provider, signer, clock) = provider(TokenLifetimeConfig::default())?;
        let mut events = provider.subscribe();

        signer.fail(true);
        advance(&clock, 2700).await;

        match events.recv().await? {
            AuthenticationEvent::RenewalFailed(error) => {
                assert_eq!(error.to_string(), "signing refused")
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(provider.next_renewal(), None);

        // still exactly the margin remaining, so the old token is served
        let creds = provider.get_device_credentials()?;
        assert_eq!(expiry_of(&creds), Some(UnixTime(3600)));

        signer.fail(false);
        clock.inc(1);
        let creds = provider.get_device_credentials()?;
        assert_eq!(expiry_of(&creds), Some(UnixTime(2701 + 3600)));
        assert_eq!(provider.next_renewal(), Some(UnixTime(2701 + 2700)));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn stale_read_failure_surfaces_to_caller() -> Result<()> {
        let (provider, signer, clock) = provider(TokenLifetimeConfig::default())?;

        signer.fail(true);
        clock.inc(3000);
        let err = provider.get_device_credentials().unwrap_err();
        assert_eq!(err.to_string(), "signing refused");

        // the existing schedule is untouched
        assert_eq!(provider.next_renewal(), Some(UnixTime(2700)));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_provider_cancels_renewal() -> Result<()> {
        let (provider, signer, clock) = provider(TokenLifetimeConfig::default())?;
        let mut events = provider.subscribe();

        drop(provider);
        advance(&clock, 10_000).await;

        assert!(matches!(events.recv().await, Err(RecvError::Closed)));
        assert_eq!(signer.calls(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn initial_signing_failure_prevents_construction() {
        let signer = CountingSigner::default();
        signer.fail(true);

        let err = SharedAccessKeyAuthenticationProvider::with_signer_and_clock(
            identity(),
            TokenLifetimeConfig::default(),
            signer,
            TestClock::new(START),
        )
        .unwrap_err();

        assert!(err.is_signing());
    }

    #[tokio::test]
    async fn margin_not_less_than_validity_is_rejected() {
        let err = SharedAccessKeyAuthenticationProvider::with_lifetime_secs(
            identity(),
            Some(100),
            Some(200),
        )
        .unwrap_err();

        assert!(err.is_invalid_lifetime());
    }

    #[test]
    fn construction_requires_a_runtime() {
        let err = SharedAccessKeyAuthenticationProvider::with_signer_and_clock(
            identity(),
            TokenLifetimeConfig::default(),
            CountingSigner::default(),
            TestClock::new(START),
        )
        .unwrap_err();

        assert!(matches!(err, ProviderError::NoRuntime(_)));
    }

    #[tokio::test]
    async fn connection_string_without_key_is_rejected() {
        let err = SharedAccessKeyAuthenticationProvider::from_connection_string(
            "HostName=hub.example.net;DeviceId=sensor-7",
            None,
            None,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            FromConnectionStringError::ConnectionString(ref e) if e.is_missing_parameter()
        ));
    }

    #[tokio::test]
    async fn connection_string_provider_signs_with_system_time() -> Result<()> {
        let before = System.now();
        let provider = SharedAccessKeyAuthenticationProvider::from_connection_string(
            "HostName=hub.example.net;DeviceId=sensor-7;SharedAccessKey=a2V5LWZvci10ZXN0cw==",
            None,
            None,
        )?;
        let after = System.now();

        let expiry = expiry_of(&provider.get_device_credentials()?).expect("expiry");
        assert!(expiry >= before + DurationSecs(3600));
        assert!(expiry <= after + DurationSecs(3600));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_stale_reads_renew_once() -> Result<()> {
        let (provider, signer, clock) = provider(TokenLifetimeConfig::default())?;
        clock.inc(3000);

        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| provider.get_device_credentials()))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("reader thread panicked"))
                .collect()
        });

        for result in results {
            assert_eq!(expiry_of(&result?), Some(UnixTime(3000 + 3600)));
        }
        assert_eq!(signer.calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn usable_through_the_provider_trait() -> Result<()> {
        fn current<P: AuthenticationProvider>(p: &P) -> Result<DeviceCredentials, P::Error> {
            p.get_device_credentials()
        }

        let (provider, _, _) = provider(TokenLifetimeConfig::default())?;
        let creds = current(&provider)?;
        assert_eq!(creds.device_id().as_str(), "sensor-7");
        Ok(())
    }
}
