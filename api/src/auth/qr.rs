//! Short-lived QR session tokens.
//!
//! A teacher projects a QR code that encodes one of these tokens; students
//! scan it and redeem the token to mark themselves present. The token is a
//! plain HS256 JWT bound to one course and expiring after a configured number
//! of seconds (60 by default), so a leaked screenshot goes stale before it can
//! travel far.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use util::config;

/// Fixed subject separating marker tokens from login JWTs signed with the
/// same secret.
const QR_SUBJECT: &str = "qr_attendance_marker";

#[derive(Debug, Serialize, Deserialize)]
struct QrClaims {
    sub: String,
    course_id: i64,
    iat: usize,
    exp: usize,
}

/// Issues a marker token for one course, returning the token and its expiry
/// timestamp.
pub fn issue_marker_token(course_id: i64) -> (String, String) {
    let now = Utc::now();
    let expiry = now + Duration::seconds(config::qr_token_seconds() as i64);

    let claims = QrClaims {
        sub: QR_SUBJECT.to_owned(),
        course_id,
        iat: now.timestamp() as usize,
        exp: expiry.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config::jwt_secret().as_bytes()),
    )
    .expect("Token encoding failed");

    (token, expiry.to_rfc3339())
}

/// Verifies a scanned marker token and returns the course it is bound to.
///
/// Any failure collapses to `None`: wrong signature, wrong subject, expired.
/// The default decoder tolerates 60 seconds of clock skew, which would double
/// the effective lifetime of a 60-second token, so leeway is pinned to zero.
pub fn verify_marker_token(token: &str) -> Option<i64> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.sub = Some(QR_SUBJECT.to_owned());

    let data = decode::<QrClaims>(
        token,
        &DecodingKey::from_secret(config::jwt_secret().as_bytes()),
        &validation,
    )
    .ok()?;

    Some(data.claims.course_id)
}
