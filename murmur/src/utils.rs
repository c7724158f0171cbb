//! Identifier and timestamp helpers.

use chrono::Utc;
use uuid::Uuid;

/// Generates a run id of the form `YYYYmmdd_HHMMSS_<8 hex>`.
///
/// The timestamp prefix keeps snapshot directories sortable by run; the random
/// suffix keeps two runs started in the same second apart.
#[must_use]
pub fn generate_run_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", Utc::now().format("%Y%m%d_%H%M%S"), &suffix[..8])
}

/// Returns the current UTC time as an ISO 8601 string.
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_shape() {
        let run_id = generate_run_id();
        let parts: Vec<&str> = run_id.split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 8);
        assert_eq!(parts[1].len(), 6);
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_run_ids_differ() {
        assert_ne!(generate_run_id(), generate_run_id());
    }

    #[test]
    fn test_iso_timestamp_is_rfc3339_utc() {
        let stamp = iso_timestamp();
        let parsed = chrono::DateTime::parse_from_rfc3339(&stamp).unwrap();

        assert_eq!(parsed.offset().local_minus_utc(), 0);
    }
}
