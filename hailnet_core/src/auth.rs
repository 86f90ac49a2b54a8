//! # Password Gate
//!
//! Access control for the advanced calculator: a salted PBKDF2-HMAC-SHA256
//! password check with an attempt counter, a timed lockout and a session
//! validity window.
//!
//! Every time-dependent operation takes `now` explicitly so the gate can be
//! driven by tests and by callers with their own clock.
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use hailnet_core::auth::{AuthGate, AuthPolicy, AuthState, LoginOutcome};
//!
//! let mut gate = AuthGate::new(AuthPolicy::default(), AuthState::default());
//! gate.initialize("orchard-secret");
//!
//! let now = Utc::now();
//! assert_eq!(gate.login("wrong", now), LoginOutcome::Rejected { attempts_remaining: 4 });
//! assert_eq!(gate.login("orchard-secret", now), LoginOutcome::Success);
//! assert!(gate.validate_session(now));
//! ```

use chrono::{DateTime, Duration, Utc};
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{info, warn};

use crate::errors::CalcError;

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 10_000;
/// Derived key length in bytes (512 bits)
pub const DERIVED_KEY_LEN: usize = 64;
/// Random salt length in bytes
pub const SALT_LEN: usize = 16;

/// Hash `password` with `salt`, hex-encoded.
///
/// The salt is used as the bytes of its hex text, so a stored record can be
/// verified from its two strings alone.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut key = [0u8; DERIVED_KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), PBKDF2_ITERATIONS, &mut key);
    hex::encode(key)
}

/// Fresh random salt, hex-encoded
pub fn generate_salt() -> String {
    hex::encode(rand::random::<[u8; SALT_LEN]>())
}

/// Equal-time comparison of two hex digests
fn digests_match(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Lockout and session limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthPolicy {
    pub max_attempts: u32,
    pub lockout: Duration,
    pub session: Duration,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        AuthPolicy {
            max_attempts: 5,
            lockout: Duration::minutes(15),
            session: Duration::hours(6),
        }
    }
}

/// Persisted gate record. Never holds the plaintext password.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthState {
    pub hashed_password: String,
    pub salt: String,
    pub is_authenticated: bool,
    pub session_start: Option<DateTime<Utc>>,
    pub login_attempts: u32,
    pub last_attempt: Option<DateTime<Utc>>,
    pub lockout_until: Option<DateTime<Utc>>,
}

impl AuthState {
    pub fn is_initialized(&self) -> bool {
        !self.hashed_password.is_empty() && !self.salt.is_empty()
    }
}

/// What a login attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoginOutcome {
    Success,
    /// Wrong password, more attempts allowed
    Rejected { attempts_remaining: u32 },
    /// Wrong password, and this failure started a lockout
    LockedOut { remaining_minutes: i64 },
    /// Attempt refused without checking the password
    Locked { remaining_minutes: i64 },
    /// No password has been set up yet
    NotInitialized,
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success)
    }

    /// Error form of a failed outcome, for callers that propagate with `?`
    pub fn into_result(self) -> Result<(), CalcError> {
        match self {
            LoginOutcome::Success => Ok(()),
            LoginOutcome::Rejected { attempts_remaining } => Err(CalcError::AuthFailed { attempts_remaining }),
            LoginOutcome::LockedOut { remaining_minutes } | LoginOutcome::Locked { remaining_minutes } => {
                Err(CalcError::Locked { remaining_minutes })
            }
            LoginOutcome::NotInitialized => Err(CalcError::NotInitialized),
        }
    }
}

/// Whole minutes, rounded up
fn ceil_minutes(duration: Duration) -> i64 {
    let ms = duration.num_milliseconds().max(0);
    (ms + 59_999) / 60_000
}

/// Session remaining as `Xh Ym`, or `expired`
pub fn format_remaining(remaining: Option<Duration>) -> String {
    match remaining {
        Some(d) if d > Duration::zero() => {
            let minutes = d.num_minutes();
            format!("{}h {}m", minutes / 60, minutes % 60)
        }
        _ => "expired".to_string(),
    }
}

/// The password gate: policy plus persisted state.
#[derive(Debug, Clone)]
pub struct AuthGate {
    policy: AuthPolicy,
    state: AuthState,
}

impl AuthGate {
    pub fn new(policy: AuthPolicy, state: AuthState) -> Self {
        AuthGate { policy, state }
    }

    pub fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn into_state(self) -> AuthState {
        self.state
    }

    /// Set the password on first use. Returns `false` (and changes nothing)
    /// when a password is already stored.
    pub fn initialize(&mut self, password: &str) -> bool {
        if self.state.is_initialized() {
            return false;
        }
        let salt = generate_salt();
        self.state.hashed_password = hash_password(password, &salt);
        self.state.salt = salt;
        info!("password gate initialized");
        true
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.state.lockout_until.is_some_and(|until| until > now)
    }

    pub fn remaining_lock_time(&self, now: DateTime<Utc>) -> Duration {
        match self.state.lockout_until {
            Some(until) if until > now => until - now,
            _ => Duration::zero(),
        }
    }

    /// Failed attempts left before a lockout
    pub fn attempts_remaining(&self) -> u32 {
        self.policy.max_attempts.saturating_sub(self.state.login_attempts)
    }

    /// Check `password`.
    ///
    /// While locked, the password is not evaluated. A failure that reaches
    /// `max_attempts` starts a lockout. The counter is only cleared by a
    /// successful login or [`AuthGate::reset_attempts`], so once a lockout
    /// has expired the next failure locks again.
    pub fn login(&mut self, password: &str, now: DateTime<Utc>) -> LoginOutcome {
        if self.is_locked(now) {
            let remaining_minutes = ceil_minutes(self.remaining_lock_time(now));
            warn!(remaining_minutes, "login refused while locked");
            return LoginOutcome::Locked { remaining_minutes };
        }

        if !self.state.is_initialized() {
            return LoginOutcome::NotInitialized;
        }

        let candidate = hash_password(password, &self.state.salt);
        if digests_match(&candidate, &self.state.hashed_password) {
            self.state.is_authenticated = true;
            self.state.login_attempts = 0;
            self.state.session_start = Some(now);
            info!("login succeeded");
            return LoginOutcome::Success;
        }

        self.state.login_attempts = self.state.login_attempts.saturating_add(1);
        self.state.last_attempt = Some(now);

        if self.state.login_attempts >= self.policy.max_attempts {
            self.state.lockout_until = Some(now + self.policy.lockout);
            let remaining_minutes = ceil_minutes(self.policy.lockout);
            warn!(attempts = self.state.login_attempts, remaining_minutes, "too many failed logins, locking");
            LoginOutcome::LockedOut { remaining_minutes }
        } else {
            let attempts_remaining = self.attempts_remaining();
            warn!(attempts_remaining, "login failed");
            LoginOutcome::Rejected { attempts_remaining }
        }
    }

    pub fn logout(&mut self) {
        self.state.is_authenticated = false;
        self.state.session_start = None;
        info!("logged out");
    }

    /// Clear the attempt counter and any lockout
    pub fn reset_attempts(&mut self) {
        self.state.login_attempts = 0;
        self.state.last_attempt = None;
        self.state.lockout_until = None;
    }

    /// Whether the session is still valid at `now`. An expired session is
    /// logged out as a side effect.
    pub fn validate_session(&mut self, now: DateTime<Utc>) -> bool {
        if !self.state.is_authenticated {
            return false;
        }

        let valid = self.state.session_start.is_some_and(|start| now < start + self.policy.session);
        if !valid {
            info!("session expired");
            self.logout();
        }
        valid
    }

    /// Time left in the current session, `None` when not logged in
    pub fn session_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if !self.state.is_authenticated {
            return None;
        }
        let start = self.state.session_start?;
        let remaining = start + self.policy.session - now;
        Some(remaining.max(Duration::zero()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PASSWORD: &str = "correct horse";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn gate() -> AuthGate {
        let mut gate = AuthGate::new(AuthPolicy::default(), AuthState::default());
        assert!(gate.initialize(PASSWORD));
        gate
    }

    #[test]
    fn test_hash_is_deterministic_per_salt() {
        let a = hash_password("pw", "00ff");
        assert_eq!(a, hash_password("pw", "00ff"));
        assert_ne!(a, hash_password("pw", "00fe"));
        assert_eq!(a.len(), DERIVED_KEY_LEN * 2);
    }

    #[test]
    fn test_salt_shape() {
        let salt = generate_salt();
        assert_eq!(salt.len(), SALT_LEN * 2);
        assert!(salt.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_initialize_only_once() {
        let mut gate = gate();
        let stored = gate.state().hashed_password.clone();
        assert!(!gate.initialize("other"));
        assert_eq!(gate.state().hashed_password, stored);
        assert_ne!(stored, PASSWORD);
    }

    #[test]
    fn test_uninitialized_login() {
        let mut gate = AuthGate::new(AuthPolicy::default(), AuthState::default());
        assert_eq!(gate.login(PASSWORD, t0()), LoginOutcome::NotInitialized);
    }

    #[test]
    fn test_successful_login_resets_counter() {
        let mut gate = gate();
        gate.login("nope", t0());
        gate.login("nope", t0());
        assert_eq!(gate.attempts_remaining(), 3);

        assert_eq!(gate.login(PASSWORD, t0()), LoginOutcome::Success);
        assert_eq!(gate.state().login_attempts, 0);
        assert_eq!(gate.state().session_start, Some(t0()));
    }

    #[test]
    fn test_lockout_after_max_attempts() {
        let mut gate = gate();
        for expected in (1..=4).rev() {
            assert_eq!(
                gate.login("nope", t0()),
                LoginOutcome::Rejected { attempts_remaining: expected }
            );
        }
        assert_eq!(gate.login("nope", t0()), LoginOutcome::LockedOut { remaining_minutes: 15 });
        assert!(gate.is_locked(t0()));

        // correct password is not even checked while locked
        let later = t0() + Duration::minutes(5) + Duration::seconds(30);
        assert_eq!(gate.login(PASSWORD, later), LoginOutcome::Locked { remaining_minutes: 10 });
        assert_eq!(gate.remaining_lock_time(later), Duration::seconds(570));
    }

    #[test]
    fn test_lock_expires() {
        let mut gate = gate();
        for _ in 0..5 {
            gate.login("nope", t0());
        }
        let after = t0() + Duration::minutes(15);
        assert!(!gate.is_locked(after));
        assert_eq!(gate.remaining_lock_time(after), Duration::zero());
        assert_eq!(gate.login(PASSWORD, after), LoginOutcome::Success);
    }

    #[test]
    fn test_failure_after_expired_lock_relocks() {
        let mut gate = gate();
        for _ in 0..5 {
            gate.login("nope", t0());
        }
        let after = t0() + Duration::minutes(16);
        assert!(matches!(gate.login("nope", after), LoginOutcome::LockedOut { .. }));
        assert!(gate.is_locked(after));
    }

    #[test]
    fn test_reset_attempts_clears_lock() {
        let mut gate = gate();
        for _ in 0..5 {
            gate.login("nope", t0());
        }
        gate.reset_attempts();
        assert!(!gate.is_locked(t0()));
        assert_eq!(gate.attempts_remaining(), 5);
    }

    #[test]
    fn test_session_window() {
        let mut gate = gate();
        gate.login(PASSWORD, t0());

        let mid = t0() + Duration::hours(2) + Duration::minutes(30);
        assert!(gate.validate_session(mid));
        assert_eq!(format_remaining(gate.session_remaining(mid)), "3h 30m");

        let end = t0() + Duration::hours(6);
        assert!(!gate.validate_session(end));
        assert!(!gate.state().is_authenticated);
        assert_eq!(gate.state().session_start, None);
        assert_eq!(format_remaining(gate.session_remaining(end)), "expired");
    }

    #[test]
    fn test_logout() {
        let mut gate = gate();
        gate.login(PASSWORD, t0());
        gate.logout();
        assert!(!gate.validate_session(t0()));
        assert!(gate.session_remaining(t0()).is_none());
    }

    #[test]
    fn test_outcome_errors() {
        assert!(LoginOutcome::Success.into_result().is_ok());
        let err = LoginOutcome::Rejected { attempts_remaining: 2 }.into_result().unwrap_err();
        assert_eq!(err, CalcError::AuthFailed { attempts_remaining: 2 });
        let err = LoginOutcome::Locked { remaining_minutes: 3 }.into_result().unwrap_err();
        assert_eq!(err.error_code(), "LOCKED");
    }

    #[test]
    fn test_not_initialized_is_its_own_error() {
        let err = LoginOutcome::NotInitialized.into_result().unwrap_err();
        assert_eq!(err, CalcError::NotInitialized);
        assert_ne!(err.error_code(), CalcError::SessionExpired.error_code());
    }

    #[test]
    fn test_state_never_contains_plaintext() {
        let mut gate = gate();
        gate.login(PASSWORD, t0());
        let json = serde_json::to_string(gate.state()).unwrap();
        assert!(!json.contains(PASSWORD));
    }
}
