//! The database probe: insert one dummy prescription and report.

use std::io::{self, Write};

use rx_config::{CredentialKey, Credentials, StoreSettings};
use rx_core::{Prescription, ProbeError, ProbeOutcome};
use serde_json::Value;
use tracing::{info, warn};

use crate::client::RecordStore;

/// Substring marking a URL that was never filled in.
pub const PLACEHOLDER_MARKER: &str = "your-supabase";

/// Leading characters of a key shown to the operator.
const KEY_PREVIEW_CHARS: usize = 5;

fn key_preview(key: &str) -> String {
    key.chars().take(KEY_PREVIEW_CHARS).collect()
}

/// Returns why the URL/key pair cannot be used, if it cannot.
fn precondition_failure(url: Option<&str>, key: Option<&str>) -> Option<String> {
    match (url, key) {
        (None | Some(""), _) => Some(format!("{} is not set", CredentialKey::SupabaseUrl.env_var())),
        (_, None | Some("")) => Some(format!("{} is not set", CredentialKey::SupabaseKey.env_var())),
        (Some(url), _) if url.contains(PLACEHOLDER_MARKER) => {
            Some(format!("{} is still a placeholder", CredentialKey::SupabaseUrl.env_var()))
        }
        _ => None,
    }
}

/// Inserts the verification record and prints the result.
///
/// `connect` builds the store from the URL and key. It runs only once the
/// configuration passes the precondition check, so a bad configuration
/// never reaches the network.
pub async fn test_connection<S, F, W>(
    credentials: &Credentials,
    settings: &StoreSettings,
    connect: F,
    out: &mut W,
) -> io::Result<ProbeOutcome<Value>>
where
    S: RecordStore,
    F: FnOnce(&str, &str) -> Result<S, ProbeError>,
    W: Write,
{
    let url = credentials.get(CredentialKey::SupabaseUrl);
    let key = credentials.get(CredentialKey::SupabaseKey);

    writeln!(out, "Testing connection to: {}", url.unwrap_or_default())?;
    match key.filter(|k| !k.is_empty()) {
        Some(k) => writeln!(out, "Using Key (truncated): {}...", key_preview(k))?,
        None => writeln!(out, "No Key Found")?,
    }

    let (url, key) = match (url, key, precondition_failure(url, key)) {
        (Some(url), Some(key), None) => (url, key),
        (_, _, reason) => {
            let reason = reason.unwrap_or_default();
            warn!("Invalid configuration: {}", reason);
            writeln!(out, "❌ Invalid configuration. Please check your environment")?;
            return Ok(ProbeOutcome::ConfigurationInvalid(reason));
        }
    };

    let store = match connect(url, key) {
        Ok(store) => store,
        Err(e) => return fail(out, e),
    };
    writeln!(out, "Client initialized. Attempting INSERT...")?;

    let row = match serde_json::to_value(Prescription::verification_sample_today()) {
        Ok(row) => row,
        Err(e) => return fail(out, e.into()),
    };

    let rows = match store.insert(&settings.table, &row).await {
        Ok(rows) => rows,
        Err(e) => return fail(out, e),
    };

    let Some(inserted) = rows.into_iter().next() else {
        writeln!(out, "❌ Insert returned no data (but no exception). Check policies?")?;
        return Ok(ProbeOutcome::Empty);
    };

    writeln!(out, "✅ INSERT SUCCESSFUL!")?;
    writeln!(out, "Inserted Record:")?;
    let pretty = serde_json::to_string_pretty(&inserted).unwrap_or_else(|_| inserted.to_string());
    writeln!(out, "{}", pretty)?;

    if settings.cleanup {
        clean_up(&store, &settings.table, &inserted, out).await?;
    }

    Ok(ProbeOutcome::Success(inserted))
}

fn fail<W: Write>(out: &mut W, err: ProbeError) -> io::Result<ProbeOutcome<Value>> {
    warn!("Insert failed: {}", err);
    writeln!(out, "FAIL: {}", err)?;
    Ok(ProbeOutcome::TransportFailure(err.to_string()))
}

/// Deletes the row just inserted. Failures are reported, never escalated.
async fn clean_up<S: RecordStore, W: Write>(
    store: &S,
    table: &str,
    inserted: &Value,
    out: &mut W,
) -> io::Result<()> {
    let Some(id) = inserted.get("id") else {
        writeln!(out, "Skipping clean-up: inserted record has no id")?;
        return Ok(());
    };

    writeln!(out, "Cleaning up...")?;
    match store.delete_by_id(table, id).await {
        Ok(rows) => {
            info!("Clean-up removed {} row(s)", rows.len());
            writeln!(out, "Removed test record {}", id)
        }
        Err(e) => writeln!(out, "Clean-up failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rx_config::Fallbacks;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Store double that replays a canned insert result and records calls.
    #[derive(Clone)]
    struct CannedStore {
        insert_reply: Arc<Mutex<Option<Result<Vec<Value>, ProbeError>>>>,
        inserted: Arc<Mutex<Vec<(String, Value)>>>,
        deleted: Arc<Mutex<Vec<Value>>>,
    }

    impl CannedStore {
        fn new(reply: Result<Vec<Value>, ProbeError>) -> Self {
            Self {
                insert_reply: Arc::new(Mutex::new(Some(reply))),
                inserted: Arc::default(),
                deleted: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl RecordStore for CannedStore {
        async fn insert(&self, table: &str, row: &Value) -> Result<Vec<Value>, ProbeError> {
            self.inserted.lock().unwrap().push((table.to_string(), row.clone()));
            self.insert_reply.lock().unwrap().take().unwrap_or(Ok(vec![]))
        }

        async fn delete_by_id(&self, _table: &str, id: &Value) -> Result<Vec<Value>, ProbeError> {
            self.deleted.lock().unwrap().push(id.clone());
            Ok(vec![json!({"id": id})])
        }
    }

    fn credentials(url: &str, key: &str) -> Credentials {
        Credentials::from_sources(
            |_| None,
            &Fallbacks::from_pairs([("SUPABASE_URL", url), ("SUPABASE_KEY", key)]),
        )
    }

    async fn run_probe(
        creds: &Credentials,
        settings: &StoreSettings,
        store: &CannedStore,
    ) -> (ProbeOutcome<Value>, String, usize) {
        let connects = AtomicUsize::new(0);
        let mut out = Vec::new();
        let outcome = test_connection(
            creds,
            settings,
            |_, _| {
                connects.fetch_add(1, Ordering::SeqCst);
                Ok(store.clone())
            },
            &mut out,
        )
        .await
        .unwrap();
        (outcome, String::from_utf8(out).unwrap(), connects.load(Ordering::SeqCst))
    }

    #[test]
    fn preview_is_first_five_chars() {
        assert_eq!(key_preview("eyJhbGciOiJIUzI1NiIs"), "eyJhb");
        assert_eq!(key_preview("abc"), "abc");
    }

    #[tokio::test]
    async fn placeholder_url_never_connects() {
        let creds = credentials("https://your-supabase-project.supabase.co", "eyJhbGci");
        let store = CannedStore::new(Ok(vec![]));

        let (outcome, printed, connects) = run_probe(&creds, &StoreSettings::default(), &store).await;

        assert_eq!(connects, 0);
        assert!(store.inserted.lock().unwrap().is_empty());
        assert_eq!(
            printed,
            "Testing connection to: https://your-supabase-project.supabase.co\n\
             Using Key (truncated): eyJhb...\n\
             ❌ Invalid configuration. Please check your environment\n"
        );
        assert_eq!(
            outcome,
            ProbeOutcome::ConfigurationInvalid("SUPABASE_URL is still a placeholder".into())
        );
    }

    #[tokio::test]
    async fn empty_url_never_connects() {
        let creds = credentials("", "eyJhbGci");
        let store = CannedStore::new(Ok(vec![]));

        let (outcome, printed, connects) = run_probe(&creds, &StoreSettings::default(), &store).await;

        assert_eq!(connects, 0);
        assert!(printed.contains("❌ Invalid configuration."));
        assert!(matches!(outcome, ProbeOutcome::ConfigurationInvalid(_)));
    }

    #[tokio::test]
    async fn missing_key_is_reported() {
        let creds = Credentials::from_sources(
            |_| None,
            &Fallbacks::from_pairs([("SUPABASE_URL", "https://demo.supabase.co")]),
        );
        let store = CannedStore::new(Ok(vec![]));

        let (outcome, printed, connects) = run_probe(&creds, &StoreSettings::default(), &store).await;

        assert_eq!(connects, 0);
        assert!(printed.contains("No Key Found\n"));
        assert_eq!(
            outcome,
            ProbeOutcome::ConfigurationInvalid("SUPABASE_KEY is not set".into())
        );
    }

    #[tokio::test]
    async fn transport_error_prints_fail_line() {
        let creds = credentials("https://demo.supabase.co", "eyJhbGci");
        let store = CannedStore::new(Err(ProbeError::Transport(
            "error sending request: connection refused".into(),
        )));

        let (outcome, printed, _) = run_probe(&creds, &StoreSettings::default(), &store).await;

        let last = printed.lines().last().unwrap();
        assert_eq!(last, "FAIL: error sending request: connection refused");
        assert!(matches!(outcome, ProbeOutcome::TransportFailure(_)));
    }

    #[tokio::test]
    async fn empty_insert_warns_about_policies() {
        let creds = credentials("https://demo.supabase.co", "eyJhbGci");
        let store = CannedStore::new(Ok(vec![]));

        let (outcome, printed, connects) = run_probe(&creds, &StoreSettings::default(), &store).await;

        assert_eq!(connects, 1);
        assert!(printed.ends_with("❌ Insert returned no data (but no exception). Check policies?\n"));
        assert_eq!(outcome, ProbeOutcome::Empty);
    }

    #[tokio::test]
    async fn success_prints_first_row_and_skips_cleanup_by_default() {
        let creds = credentials("https://demo.supabase.co", "eyJhbGci");
        let store = CannedStore::new(Ok(vec![json!({"id": 7, "patient_name": "Test Patient"})]));

        let (outcome, printed, _) = run_probe(&creds, &StoreSettings::default(), &store).await;

        assert!(printed.contains("Client initialized. Attempting INSERT...\n"));
        assert!(printed.contains(
            "✅ INSERT SUCCESSFUL!\nInserted Record:\n{\n  \"id\": 7,\n  \"patient_name\": \"Test Patient\"\n}\n"
        ));
        assert!(store.deleted.lock().unwrap().is_empty());
        assert_eq!(outcome, ProbeOutcome::Success(json!({"id": 7, "patient_name": "Test Patient"})));

        let inserted = store.inserted.lock().unwrap();
        let (table, row) = &inserted[0];
        assert_eq!(table, "prescriptions");
        assert_eq!(row["doctor_license"], "TEST1234");
        assert_eq!(row["medications"][0]["name"], "TestMeds");
    }

    #[tokio::test]
    async fn cleanup_deletes_inserted_row() {
        let creds = credentials("https://demo.supabase.co", "eyJhbGci");
        let store = CannedStore::new(Ok(vec![json!({"id": 7})]));
        let settings = StoreSettings {
            cleanup: true,
            table: "rx_staging".into(),
            ..StoreSettings::default()
        };

        let (outcome, printed, _) = run_probe(&creds, &settings, &store).await;

        assert!(outcome.is_success());
        assert_eq!(*store.deleted.lock().unwrap(), vec![json!(7)]);
        assert!(printed.ends_with("Cleaning up...\nRemoved test record 7\n"));
        assert_eq!(store.inserted.lock().unwrap()[0].0, "rx_staging");
    }
}
