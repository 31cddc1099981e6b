use hubauth_clock::{Clock, DurationSecs, UnixTime};
use serde::{Deserialize, Serialize};

use crate::{error, SharedAccessSignature, SharedAccessSignatureRef};

/// Configuration for how long tokens live and when they should be renewed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenLifetimeConfig {
    valid_duration: DurationSecs,
    renewal_margin: DurationSecs,
}

impl Default for TokenLifetimeConfig {
    /// Default lifetime configuration
    ///
    /// Tokens are valid for one hour and are renewed fifteen minutes before
    /// they expire.
    fn default() -> Self {
        Self {
            valid_duration: Self::DEFAULT_VALID_DURATION,
            renewal_margin: Self::DEFAULT_RENEWAL_MARGIN,
        }
    }
}

impl TokenLifetimeConfig {
    /// Default validity of each token
    pub const DEFAULT_VALID_DURATION: DurationSecs = DurationSecs(3600);

    /// Default margin before expiry at which a token is renewed
    pub const DEFAULT_RENEWAL_MARGIN: DurationSecs = DurationSecs(900);

    /// Constructs a new lifetime configuration
    ///
    /// Every token will be valid for `valid_duration` and will be considered
    /// stale once less than `renewal_margin` of that validity remains. The
    /// margin must be strictly less than the validity duration.
    pub fn new(
        valid_duration: DurationSecs,
        renewal_margin: DurationSecs,
    ) -> Result<Self, error::InvalidTokenLifetime> {
        if valid_duration <= renewal_margin {
            return Err(error::invalid_token_lifetime(valid_duration, renewal_margin));
        }

        Ok(Self {
            valid_duration,
            renewal_margin,
        })
    }

    /// Constructs a lifetime configuration from optional overrides
    ///
    /// An absent or zero value falls back to the corresponding default.
    pub fn from_optional_secs(
        valid_duration: Option<u64>,
        renewal_margin: Option<u64>,
    ) -> Result<Self, error::InvalidTokenLifetime> {
        let valid_duration = valid_duration
            .filter(|&s| s != 0)
            .map_or(Self::DEFAULT_VALID_DURATION, DurationSecs);
        let renewal_margin = renewal_margin
            .filter(|&s| s != 0)
            .map_or(Self::DEFAULT_RENEWAL_MARGIN, DurationSecs);
        Self::new(valid_duration, renewal_margin)
    }

    /// How long each token is valid
    #[inline]
    pub fn valid_duration(&self) -> DurationSecs {
        self.valid_duration
    }

    /// How long before expiry a token is renewed
    #[inline]
    pub fn renewal_margin(&self) -> DurationSecs {
        self.renewal_margin
    }

    /// Time between a token being issued and its scheduled renewal
    #[inline]
    pub fn renewal_interval(&self) -> DurationSecs {
        self.valid_duration - self.renewal_margin
    }

    pub(crate) fn window(&self, token: SharedAccessSignature, issued: UnixTime) -> TokenWindow {
        TokenWindow {
            token,
            issued,
            stale: issued + self.renewal_interval(),
            expiry: issued + self.valid_duration,
        }
    }
}

/// A token's lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
    /// The token is fresh and valid
    Fresh,
    /// The token is valid, but should be renewed
    Stale,
    /// The token is no longer valid
    Expired,
}

/// The currently held token along with its lifetime
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenWindow {
    token: SharedAccessSignature,
    issued: UnixTime,
    stale: UnixTime,
    expiry: UnixTime,
}

impl TokenWindow {
    /// Gets the signed token
    #[inline]
    pub fn token(&self) -> &SharedAccessSignatureRef {
        &self.token
    }

    /// Gets the time that the token was issued
    #[inline]
    pub fn issued(&self) -> UnixTime {
        self.issued
    }

    /// Gets the time that the token will become stale
    #[inline]
    pub fn stale(&self) -> UnixTime {
        self.stale
    }

    /// Gets the time that the token will expire
    #[inline]
    pub fn expiry(&self) -> UnixTime {
        self.expiry
    }

    /// Gets the token's lifetime status based on the current time
    /// as reported by the provided clock
    #[inline]
    pub fn token_status_with_clock<C: Clock>(&self, clock: &C) -> TokenStatus {
        self.token_status_at(clock.now())
    }

    /// Gets the token's lifetime status as of the provided time
    ///
    /// A token is stale once strictly less than the renewal margin remains
    /// before it expires.
    #[inline]
    pub fn token_status_at(&self, time: UnixTime) -> TokenStatus {
        if time <= self.stale {
            TokenStatus::Fresh
        } else if time < self.expiry {
            TokenStatus::Stale
        } else {
            TokenStatus::Expired
        }
    }

    /// Whether the token should be renewed as of the provided time
    #[inline]
    pub fn needs_renewal_at(&self, time: UnixTime) -> bool {
        !matches!(self.token_status_at(time), TokenStatus::Fresh)
    }

    /// Gets a duration for how much longer the token would be valid as of the
    /// provided time
    #[inline]
    pub fn until_expired_at(&self, time: UnixTime) -> DurationSecs {
        time.until(self.expiry)
    }
}
