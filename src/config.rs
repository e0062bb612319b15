//! Forwarding-list persistence
//!
//! Forwarding lists are standalone JSON files: an ordered array of
//! [`ForwardedItemInfo`] objects. The file shape (`address`, `remotePort`
//! tagged union, `localPort`, `allowLan`) is a compatibility surface shared
//! with other consumers and must round-trip exactly.
//!
//! Serialization strips engine identities; turning a loaded snapshot back
//! into live rules goes through [`RuleRegistry::add_rule`] one entry at a
//! time, so each entry fails independently while a malformed file fails as a
//! whole.

use std::path::{Path, PathBuf};

use crate::core::engine::RuleId;
use crate::core::error::{Error, Result};
use crate::core::forward::{ForwardedItemInfo, ForwardingRule, MAX_RULES};
use crate::core::registry::RuleRegistry;

/// Encodes the ordered rule list as pretty-printed JSON, engine ids stripped.
///
/// # Errors
///
/// Returns `Err` only on serializer failure, which for this model means an
/// internal bug rather than bad input.
pub fn serialize_rules(rules: &[ForwardingRule]) -> Result<String> {
    let infos: Vec<ForwardedItemInfo> = rules.iter().map(ForwardedItemInfo::from_rule).collect();
    Ok(serde_json::to_string_pretty(&infos)?)
}

/// Decodes a forwarding-list file.
///
/// A decode failure is terminal for the whole file — there is no partial-list
/// recovery. Files with more than [`MAX_RULES`] entries are rejected outright:
/// the engine could never start them all, so failing early avoids pointless
/// engine churn.
///
/// # Errors
///
/// Returns `Err` on malformed JSON or an oversized list.
pub fn deserialize_rules(json: &str) -> Result<Vec<ForwardedItemInfo>> {
    let infos: Vec<ForwardedItemInfo> = serde_json::from_str(json)?;

    if infos.len() > MAX_RULES {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("list contains {} rules (max: {MAX_RULES})", infos.len()),
        )));
    }

    Ok(infos)
}

/// Saves the live rule list to `path` atomically.
///
/// Uses a temporary file + rename pattern to prevent a truncated list if the
/// process crashes or the disk fills up mid-write. On Unix the file is
/// created 0o600 before any data is written.
///
/// # Async
/// Uses `tokio::fs` for non-blocking I/O.
///
/// # Errors
///
/// Returns `Err` on serialization or file I/O failure.
pub async fn save_rules(path: &Path, rules: &[ForwardingRule]) -> Result<()> {
    let json = serialize_rules(rules)?;

    let mut temp_path = path.to_path_buf();
    temp_path.set_extension("json.tmp");

    #[cfg(unix)]
    {
        use tokio::fs::OpenOptions;
        use tokio::io::AsyncWriteExt;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .mode(0o600)
            .open(&temp_path)
            .await?;

        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
    }

    #[cfg(not(unix))]
    {
        tokio::fs::write(&temp_path, &json).await?;
    }

    tokio::fs::rename(temp_path, path).await?;
    tracing::debug!(path = %path.display(), rules = rules.len(), "forwarding list saved");
    Ok(())
}

/// Loads a forwarding-list file from `path`.
///
/// # Async
/// Uses `tokio::fs` for non-blocking I/O.
///
/// # Errors
///
/// Returns `Err` on read failure or a malformed file (terminal for the file).
pub async fn load_rules(path: &Path) -> Result<Vec<ForwardedItemInfo>> {
    let json = tokio::fs::read_to_string(path).await?;
    let infos = deserialize_rules(&json)?;
    tracing::debug!(path = %path.display(), rules = infos.len(), "forwarding list loaded");
    Ok(infos)
}

/// Synchronous wrapper for [`load_rules`] for use during startup
/// initialization, before an async context exists.
pub fn load_rules_blocking(path: &Path) -> Result<Vec<ForwardedItemInfo>> {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        handle.block_on(load_rules(path))
    } else {
        tokio::runtime::Runtime::new()?.block_on(load_rules(path))
    }
}

/// Instantiates live rules from decoded snapshots, one registry call per
/// entry.
///
/// Each entry's failure is independent: a rejected address or an engine
/// refusal produces one `Err` in the returned sequence and never aborts the
/// remaining entries. Results are in entry order, carrying the new engine id
/// on success.
pub fn instantiate(registry: &mut RuleRegistry, infos: &[ForwardedItemInfo]) -> Vec<Result<RuleId>> {
    infos
        .iter()
        .map(|info| {
            registry
                .add_rule(&info.to_descriptor())
                .map(ForwardingRule::rule_id)
        })
        .collect()
}

/// Reads, decodes, and instantiates every configured forwarding-list source.
///
/// Per file: a read or decode failure is terminal for that file and
/// contributes a single `Err` entry; entries of a well-formed file are then
/// added one by one, each failing independently. A bad file never aborts
/// processing of subsequent files.
///
/// # Async
/// File reads use `tokio::fs`; the registry calls themselves are synchronous.
pub async fn load_and_instantiate(
    registry: &mut RuleRegistry,
    paths: &[PathBuf],
) -> Vec<Result<RuleId>> {
    let mut results = Vec::new();

    for path in paths {
        match load_rules(path).await {
            Ok(infos) => results.extend(instantiate(registry, &infos)),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "skipping unreadable forwarding list");
                results.push(Err(err));
            }
        }
    }

    results
}
