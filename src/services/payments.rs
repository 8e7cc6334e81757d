use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

/// Simulated payment gateway: an in-process ledger of short-lived tokens.
/// Tokens are single-use; `consume` flips them with a compare-and-swap under
/// the ledger mutex so a token can never back two bookings, and `release`
/// hands one back when booking creation fails after the flip.
pub struct PaymentLedger {
    tokens: Mutex<HashMap<String, PaymentRecord>>,
    ttl_secs: i64,
    allow_reuse: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum TokenState {
    Issued,
    Consumed,
}

#[derive(Debug, Clone)]
struct PaymentRecord {
    user_id: i64,
    #[allow(dead_code)]
    amount: f64,
    state: TokenState,
    issued_at: i64,
}

impl PaymentLedger {
    pub fn new(ttl_secs: i64, allow_reuse: bool) -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            ttl_secs,
            allow_reuse,
        }
    }

    /// Always succeeds (simulated gateway). Token format keeps the legacy
    /// time + user shape; the uuid suffix keeps tokens issued in the same
    /// second distinct.
    pub fn issue(&self, user_id: i64, amount: f64) -> String {
        let now = Utc::now().timestamp();
        let token = format!("pay_{}_{}_{}", now, user_id, Uuid::new_v4().simple());

        let mut tokens = self.tokens.lock().unwrap();
        tokens.retain(|_, rec| now < rec.issued_at + self.ttl_secs);
        tokens.insert(
            token.clone(),
            PaymentRecord {
                user_id,
                amount,
                state: TokenState::Issued,
                issued_at: now,
            },
        );
        token
    }

    /// True only if the token exists, belongs to the caller, has not expired
    /// and has not been used. Marks it consumed unless reuse is allowed.
    pub fn consume(&self, token: &str, user_id: i64) -> bool {
        let now = Utc::now().timestamp();
        let mut tokens = self.tokens.lock().unwrap();

        let Some(rec) = tokens.get_mut(token) else {
            return false;
        };
        if rec.user_id != user_id || now >= rec.issued_at + self.ttl_secs {
            return false;
        }
        if rec.state != TokenState::Issued {
            return false;
        }
        if !self.allow_reuse {
            rec.state = TokenState::Consumed;
        }
        true
    }

    /// Roll back an eager consumption when a later booking step fails.
    pub fn release(&self, token: &str) {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(rec) = tokens.get_mut(token) {
            if rec.state == TokenState::Consumed {
                rec.state = TokenState::Issued;
            }
        }
    }
}
