//! Request-shape and tier-limit validation, applied at intake before a
//! request is queued.

use crate::error::CoreError;
use crate::types::TryOnRequest;

/// Validate a try-on request.
///
/// - `owner_id` is non-blank.
/// - `notify_address` looks like an email address.
/// - the subject and every garment URL are absolute `http(s)` URLs.
/// - at least one garment is requested.
/// - the tier's total image limit is respected.
pub fn validate_request(request: &TryOnRequest) -> Result<(), CoreError> {
    if request.owner_id.trim().is_empty() {
        return Err(CoreError::Validation("user_id must not be empty".into()));
    }

    if !looks_like_email(&request.notify_address) {
        return Err(CoreError::Validation(format!(
            "Invalid email address '{}'",
            request.notify_address
        )));
    }

    if !is_http_url(&request.subject_image_url) {
        return Err(CoreError::Validation(format!(
            "person_image must be an http(s) URL, got '{}'",
            request.subject_image_url
        )));
    }

    if request.garments.is_empty() {
        return Err(CoreError::Validation(
            "garment_images must contain at least one garment".into(),
        ));
    }

    for (garment_id, url) in &request.garments {
        if garment_id.trim().is_empty() {
            return Err(CoreError::Validation(
                "garment_images keys must not be empty".into(),
            ));
        }
        if !is_http_url(url) {
            return Err(CoreError::Validation(format!(
                "Image for garment '{garment_id}' must be an http(s) URL, got '{url}'"
            )));
        }
    }

    if let Some(max) = request.tier.max_total_images() {
        if request.total_images() > max {
            return Err(CoreError::Validation(format!(
                "{} plan: max {max} total images allowed (garment + person)",
                request.tier.label()
            )));
        }
    }

    Ok(())
}

/// `true` for an absolute `http://` or `https://` URL with a non-empty host.
pub fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            !host.is_empty() && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use indexmap::IndexMap;

    use super::*;
    use crate::types::Tier;

    fn request(tier: Tier, garments: usize) -> TryOnRequest {
        TryOnRequest {
            owner_id: "user-1".into(),
            notify_address: "user@example.com".into(),
            subject_image_url: "https://img.example/person.png".into(),
            garments: (1..=garments)
                .map(|i| (format!("g{i}"), format!("https://img.example/g{i}.png")))
                .collect::<IndexMap<_, _>>(),
            tier,
        }
    }

    #[test]
    fn trial_with_two_garments_is_accepted() {
        assert!(validate_request(&request(Tier::Trial, 2)).is_ok());
    }

    #[test]
    fn trial_with_three_garments_is_rejected() {
        let err = validate_request(&request(Tier::Trial, 3)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: Trial plan: max 3 total images allowed (garment + person)"
        );
    }

    #[test]
    fn premium_has_no_image_limit() {
        assert!(validate_request(&request(Tier::Premium, 12)).is_ok());
    }

    #[test]
    fn empty_garments_are_rejected() {
        assert_matches!(
            validate_request(&request(Tier::Premium, 0)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn blank_owner_is_rejected() {
        let mut req = request(Tier::Premium, 1);
        req.owner_id = "  ".into();
        assert_matches!(validate_request(&req), Err(CoreError::Validation(_)));
    }

    #[test]
    fn bad_email_is_rejected() {
        let mut req = request(Tier::Premium, 1);
        req.notify_address = "not-an-email".into();
        assert_matches!(validate_request(&req), Err(CoreError::Validation(_)));
    }

    #[test]
    fn non_http_garment_url_is_rejected() {
        let mut req = request(Tier::Premium, 1);
        req.garments.insert("g2".into(), "ftp://files/g2.png".into());
        let err = validate_request(&req).unwrap_err();
        assert!(err.to_string().contains("garment 'g2'"));
    }

    #[test]
    fn http_url_detection() {
        assert!(is_http_url("https://cdn.example/a.png"));
        assert!(is_http_url("http://localhost:8080/a.png?x=1"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("https:///path"));
        assert!(!is_http_url("file:///etc/passwd"));
        assert!(!is_http_url("https://cdn.example/a b.png"));
    }
}
