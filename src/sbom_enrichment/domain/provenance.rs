use super::reference::reference_digest;
use crate::shared::error::SbomError;
use crate::shared::Result;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

const IMAGE_DIGEST_RESULT: &str = "IMAGE_DIGEST";
const SBOM_BLOB_URL_RESULT: &str = "SBOM_BLOB_URL";

/// One line of `cosign verify-attestation` output: a DSSE envelope.
#[derive(Debug, Deserialize)]
struct AttestationEnvelope {
    payload: String,
}

/// The in-toto statement carried in the envelope payload.
#[derive(Debug, Deserialize)]
struct Statement {
    #[serde(default)]
    predicate: Value,
}

/// A SLSA v0.2 build provenance predicate.
///
/// The predicate is kept as raw JSON: attestations from different build
/// systems vary in shape, and only a few fields are ever read.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance02 {
    predicate: Value,
}

impl Provenance02 {
    pub fn new(predicate: Value) -> Self {
        Self { predicate }
    }

    /// Parses one attestation line emitted by cosign.
    pub fn from_cosign_output(raw: &[u8]) -> Result<Self> {
        let envelope: AttestationEnvelope = serde_json::from_slice(raw)
            .map_err(|e| SbomError::format(format!("invalid attestation envelope: {}", e)))?;

        let payload = BASE64
            .decode(envelope.payload.trim())
            .map_err(|e| SbomError::format(format!("attestation payload is not base64: {}", e)))?;

        let statement: Statement = serde_json::from_slice(&payload)
            .map_err(|e| SbomError::format(format!("invalid in-toto statement: {}", e)))?;

        Ok(Self::new(statement.predicate))
    }

    pub fn predicate(&self) -> &Value {
        &self.predicate
    }

    /// When the build finished. Timestamps without an offset are read as
    /// UTC. Missing or malformed timestamps sort before every real one.
    pub fn build_finished_on(&self) -> DateTime<Utc> {
        self.predicate
            .pointer("/metadata/buildFinishedOn")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Finds the digest of the SBOM the build produced for `reference`.
    ///
    /// Scans the build task results for an `IMAGE_DIGEST` equal to the
    /// reference's digest paired with an `SBOM_BLOB_URL`, and returns the
    /// digest after `@` in that URL.
    pub fn get_sbom_digest(&self, reference: &str) -> Result<String> {
        let image_digest = reference_digest(reference)?;

        for task in self.tasks() {
            let results = task_results(task);
            let digest = results
                .iter()
                .find(|(name, _)| *name == IMAGE_DIGEST_RESULT)
                .map(|(_, value)| *value);
            let blob_url = results
                .iter()
                .find(|(name, _)| *name == SBOM_BLOB_URL_RESULT)
                .map(|(_, value)| *value);

            let (Some(digest), Some(blob_url)) = (digest, blob_url) else {
                continue;
            };
            if digest.trim() != image_digest {
                continue;
            }

            let (_, sbom_digest) = blob_url.trim().split_once('@').ok_or_else(|| {
                SbomError::format(format!("SBOM blob URL has no digest: {}", blob_url))
            })?;
            return Ok(sbom_digest.to_string());
        }

        Err(SbomError::SbomDigestNotFound {
            reference: reference.to_string(),
        }
        .into())
    }

    fn tasks(&self) -> impl Iterator<Item = &Value> {
        self.predicate
            .pointer("/buildConfig/tasks")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|timestamp| timestamp.and_utc())
}

/// Collects `(name, value)` pairs of a task's string results.
fn task_results(task: &Value) -> Vec<(&str, &str)> {
    task.get("results")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|result| {
            let name = result.get("name")?.as_str()?;
            let value = result.get("value")?.as_str()?;
            Some((name, value))
        })
        .collect()
}

/// Picks the provenance whose build finished last. Ties keep the earliest
/// entry in input order.
pub fn latest_provenance(provenances: Vec<Provenance02>) -> Option<Provenance02> {
    provenances.into_iter().reduce(|latest, candidate| {
        if candidate.build_finished_on() > latest.build_finished_on() {
            candidate
        } else {
            latest
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provenance_finished_on(timestamp: Option<&str>, marker: &str) -> Provenance02 {
        let mut predicate = json!({ "builder": { "id": marker } });
        if let Some(timestamp) = timestamp {
            predicate["metadata"] = json!({ "buildFinishedOn": timestamp });
        }
        Provenance02::new(predicate)
    }

    fn provenance_with_tasks(tasks: Value) -> Provenance02 {
        Provenance02::new(json!({ "buildConfig": { "tasks": tasks } }))
    }

    #[test]
    fn test_from_cosign_output() {
        let statement = json!({
            "_type": "https://in-toto.io/Statement/v0.1",
            "predicateType": "https://slsa.dev/provenance/v0.2",
            "predicate": { "metadata": { "buildFinishedOn": "2024-05-01T10:00:00Z" } },
        });
        let line = json!({
            "payloadType": "application/vnd.in-toto+json",
            "payload": BASE64.encode(statement.to_string()),
            "signatures": [],
        });

        let provenance = Provenance02::from_cosign_output(line.to_string().as_bytes()).unwrap();
        assert_eq!(
            provenance.build_finished_on().to_rfc3339(),
            "2024-05-01T10:00:00+00:00"
        );
    }

    #[test]
    fn test_from_cosign_output_invalid_payload() {
        let line = json!({ "payload": "!!not base64!!" });
        let err = Provenance02::from_cosign_output(line.to_string().as_bytes()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SbomError>(),
            Some(SbomError::Format { .. })
        ));
    }

    #[test]
    fn test_build_finished_on_defaults_to_minimum() {
        assert_eq!(
            provenance_finished_on(None, "a").build_finished_on(),
            DateTime::<Utc>::MIN_UTC
        );
        assert_eq!(
            provenance_finished_on(Some("yesterday"), "b").build_finished_on(),
            DateTime::<Utc>::MIN_UTC
        );
    }

    #[test]
    fn test_latest_provenance_picks_maximum() {
        let t1 = provenance_finished_on(Some("2024-01-01T00:00:00Z"), "t1");
        let t2 = provenance_finished_on(Some("2024-03-01T00:00:00Z"), "t2");
        let t3 = provenance_finished_on(Some("2024-02-01T00:00:00+01:00"), "t3");

        let latest = latest_provenance(vec![t1, t3.clone(), t2.clone()]).unwrap();
        assert_eq!(latest, t2);
    }

    #[test]
    fn test_latest_provenance_prefers_real_timestamp_over_missing() {
        let missing = provenance_finished_on(None, "missing");
        let real = provenance_finished_on(Some("1999-01-01T00:00:00Z"), "real");
        assert_eq!(latest_provenance(vec![missing, real.clone()]).unwrap(), real);
    }

    #[test]
    fn test_build_finished_on_without_offset_is_utc() {
        let naive = provenance_finished_on(Some("2024-01-01T00:00:00"), "naive");
        assert_eq!(
            naive.build_finished_on().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );

        let fractional = provenance_finished_on(Some("2024-01-01T00:00:00.250"), "fractional");
        assert_eq!(
            fractional.build_finished_on().to_rfc3339(),
            "2024-01-01T00:00:00.250+00:00"
        );
    }

    #[test]
    fn test_latest_provenance_ranks_naive_timestamp_by_value() {
        let missing = provenance_finished_on(None, "missing");
        let older = provenance_finished_on(Some("2023-06-01T00:00:00Z"), "older");
        let naive = provenance_finished_on(Some("2024-01-01T00:00:00"), "naive");

        assert_eq!(
            latest_provenance(vec![missing, naive.clone(), older]).unwrap(),
            naive
        );
    }

    #[test]
    fn test_latest_provenance_ties_keep_input_order() {
        let first = provenance_finished_on(Some("2024-01-01T00:00:00Z"), "first");
        let second = provenance_finished_on(Some("2024-01-01T00:00:00Z"), "second");
        assert_eq!(latest_provenance(vec![first.clone(), second]).unwrap(), first);
        assert!(latest_provenance(vec![]).is_none());
    }

    #[test]
    fn test_get_sbom_digest_matches_image_digest() {
        let provenance = provenance_with_tasks(json!([
            { "name": "clone", "results": [{ "name": "commit", "value": "abc" }] },
            { "name": "build-other", "results": [
                { "name": "IMAGE_DIGEST", "value": "sha256:0000" },
                { "name": "SBOM_BLOB_URL", "value": "quay.io/org/repo@sha256:1111" },
            ]},
            { "name": "build", "results": [
                { "name": "IMAGE_DIGEST", "value": "sha256:aaaa" },
                { "name": "SBOM_BLOB_URL", "value": "quay.io/org/repo@sha256:2222" },
            ]},
        ]));

        assert_eq!(
            provenance
                .get_sbom_digest("quay.io/org/repo@sha256:aaaa")
                .unwrap(),
            "sha256:2222"
        );
    }

    #[test]
    fn test_get_sbom_digest_no_matching_pair() {
        let provenance = provenance_with_tasks(json!([
            { "name": "build", "results": [
                { "name": "IMAGE_DIGEST", "value": "sha256:aaaa" },
            ]},
            { "name": "push-sbom", "results": [
                { "name": "SBOM_BLOB_URL", "value": "quay.io/org/repo@sha256:2222" },
            ]},
        ]));

        let err = provenance
            .get_sbom_digest("quay.io/org/repo@sha256:aaaa")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SbomError>(),
            Some(SbomError::SbomDigestNotFound { .. })
        ));
    }

    #[test]
    fn test_get_sbom_digest_without_build_config() {
        let provenance = Provenance02::new(json!({}));
        assert!(provenance
            .get_sbom_digest("quay.io/org/repo@sha256:aaaa")
            .is_err());
    }
}
